use crate::keys::validate_key;
use crate::traits::{StorageError, StorageProvider, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWrite;

/// Local filesystem bucket. The files under `base_path` are authoritative, so
/// staging is a presence check and the remote operations have nothing to do.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Bucket root directory (e.g., "/srv/keepsake/photos")
    /// * `base_url` - Base URL the directory is served from
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn require_file(&self, storage_key: &str) -> StorageResult<PathBuf> {
        let path = self.key_to_path(storage_key)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(StorageError::NotFound(storage_key.to_string()));
        }
        Ok(path)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl StorageProvider for LocalStorage {
    async fn ensure_local_file(&self, path: &str) -> StorageResult<()> {
        self.require_file(path).await.map(|_| ())
    }

    async fn release_local_file(&self, path: &str) {
        tracing::trace!(key = %path, "Local bucket file kept on release");
    }

    fn full_path(&self, path: &str) -> StorageResult<PathBuf> {
        self.key_to_path(path)
    }

    async fn load(
        &self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> StorageResult<u64> {
        let file_path = self.require_file(path).await?;
        let mut file = fs::File::open(&file_path).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to open file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        let written = tokio::io::copy(&mut file, sink).await.map_err(|e| {
            StorageError::DownloadFailed(format!(
                "Failed to read file {}: {}",
                file_path.display(),
                e
            ))
        })?;
        Ok(written)
    }

    async fn update_remote_file(&self, path: &str, _mime_type: &str) -> StorageResult<()> {
        // The local copy is the bucket copy; only verify it is there.
        self.require_file(path).await.map(|_| ())
    }

    async fn delete_remote_file(&self, path: &str) -> StorageResult<()> {
        self.key_to_path(path)?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        let file_path = self.key_to_path(path)?;
        let start = std::time::Instant::now();

        if !fs::try_exists(&file_path).await.unwrap_or(false) {
            return Ok(());
        }

        fs::remove_file(&file_path).await.map_err(|e| {
            StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                file_path.display(),
                e
            ))
        })?;

        tracing::info!(
            path = %file_path.display(),
            key = %path,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        let file_path = self.require_file(path).await?;
        let meta = fs::metadata(&file_path)
            .await
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(meta.len())
    }

    async fn presigned_url(&self, path: &str, _expires_in: Duration) -> StorageResult<String> {
        self.key_to_path(path)?;
        Ok(self.generate_url(path))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
