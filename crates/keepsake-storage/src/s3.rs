use crate::keys::validate_key;
use crate::traits::{StorageError, StorageProvider, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, Attributes, ObjectStoreExt, PutOptions, PutPayload, Result as ObjectResult,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// S3 bucket staged through a local directory.
///
/// Objects are downloaded to `staging_root/<key>` on demand and pushed back from
/// there. Directories already created under the staging root are remembered so
/// repeated staging does not hit the filesystem for them again.
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    staging_root: PathBuf,
    known_dirs: Mutex<HashSet<PathBuf>>,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `staging_root` - Local directory staged copies are written to
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        staging_root: PathBuf,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        fs::create_dir_all(&staging_root).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create staging directory {}: {}",
                staging_root.display(),
                e
            ))
        })?;

        Ok(S3Storage {
            store,
            bucket,
            staging_root,
            known_dirs: Mutex::new(HashSet::new()),
        })
    }

    fn local_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.staging_root.join(key))
    }

    fn location(key: &str) -> Path {
        Path::from(key.to_string())
    }

    /// Ensure parent directory exists, consulting the directory cache first.
    async fn ensure_parent_dir(&self, path: &std::path::Path) -> StorageResult<()> {
        let Some(parent) = path.parent() else {
            return Ok(());
        };

        let known = self
            .known_dirs
            .lock()
            .map(|dirs| dirs.contains(parent))
            .unwrap_or(false);
        if known {
            return Ok(());
        }

        fs::create_dir_all(parent).await?;
        if let Ok(mut dirs) = self.known_dirs.lock() {
            dirs.insert(parent.to_path_buf());
        }
        Ok(())
    }

    fn map_get_error(&self, key: &str, err: ObjectStoreError) -> StorageError {
        match err {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    bucket = %self.bucket,
                    key = %key,
                    "S3 download failed"
                );
                StorageError::DownloadFailed(other.to_string())
            }
        }
    }

    async fn download_to(&self, key: &str, target: &std::path::Path) -> StorageResult<u64> {
        let result: ObjectResult<_> = self.store.get(&Self::location(key)).await;
        let result = result.map_err(|e| self.map_get_error(key, e))?;
        write_staged(result.into_stream(), target).await
    }
}

/// Write a downloaded object next to `target` and move it into place once
/// complete. A failed download leaves neither file behind.
async fn write_staged<S, E>(stream: S, target: &std::path::Path) -> StorageResult<u64>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut partial = target.as_os_str().to_owned();
    partial.push(".partial");
    let partial = PathBuf::from(partial);

    match write_partial(stream, &partial).await {
        Ok(written) => {
            fs::rename(&partial, target).await?;
            Ok(written)
        }
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&partial).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        path = %partial.display(),
                        error = %remove_err,
                        "Failed to remove partial download"
                    );
                }
            }
            Err(e)
        }
    }
}

async fn write_partial<S, E>(mut stream: S, partial: &std::path::Path) -> StorageResult<u64>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    let mut file = fs::File::create(partial).await.map_err(|e| {
        StorageError::DownloadFailed(format!(
            "Failed to create file {}: {}",
            partial.display(),
            e
        ))
    })?;

    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.sync_all().await?;
    Ok(written)
}

#[async_trait]
impl StorageProvider for S3Storage {
    async fn ensure_local_file(&self, path: &str) -> StorageResult<()> {
        let local = self.local_path(path)?;
        if fs::try_exists(&local).await.unwrap_or(false) {
            tracing::trace!(key = %path, "S3 object already staged");
            return Ok(());
        }

        self.ensure_parent_dir(&local).await?;
        let start = std::time::Instant::now();
        let size = self.download_to(path, &local).await?;

        tracing::info!(
            bucket = %self.bucket,
            key = %path,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 object staged locally"
        );
        Ok(())
    }

    async fn release_local_file(&self, path: &str) {
        let Ok(local) = self.local_path(path) else {
            return;
        };
        match fs::remove_file(&local).await {
            Ok(()) => tracing::debug!(key = %path, "Staged copy released"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(error = %e, key = %path, "Failed to release staged copy"),
        }
    }

    fn full_path(&self, path: &str) -> StorageResult<PathBuf> {
        self.local_path(path)
    }

    async fn load(
        &self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> StorageResult<u64> {
        let local = self.local_path(path)?;
        if fs::try_exists(&local).await.unwrap_or(false) {
            let mut file = fs::File::open(&local).await?;
            return Ok(tokio::io::copy(&mut file, sink).await?);
        }

        let result: ObjectResult<_> = self.store.get(&Self::location(path)).await;
        let result = result.map_err(|e| self.map_get_error(path, e))?;

        let mut written = 0u64;
        let mut stream = result.into_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| StorageError::DownloadFailed(e.to_string()))?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }

    async fn update_remote_file(&self, path: &str, mime_type: &str) -> StorageResult<()> {
        let local = self.local_path(path)?;
        let data = fs::read(&local).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to read {}: {}", local.display(), e))
        })?;
        let size = data.len() as u64;
        let start = std::time::Instant::now();

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, mime_type.to_string().into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let result: ObjectResult<_> = object_store::ObjectStore::put_opts(
            &self.store,
            &Self::location(path),
            PutPayload::from(Bytes::from(data)),
            options,
        )
        .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %path,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %path,
            size_bytes = size,
            content_type = %mime_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );
        Ok(())
    }

    async fn delete_remote_file(&self, path: &str) -> StorageResult<()> {
        validate_key(path)?;
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = self.store.delete(&Self::location(path)).await;
        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %path,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let local = self.local_path(path)?;
        match fs::remove_file(&local).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                local.display(),
                e
            ))),
        }
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        let local = self.local_path(path)?;
        let meta = fs::metadata(&local).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::BackendError(e.to_string()),
        })?;
        Ok(meta.len())
    }

    async fn presigned_url(&self, path: &str, expires_in: Duration) -> StorageResult<String> {
        validate_key(path)?;
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &Self::location(path), expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();
        Ok(url)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
