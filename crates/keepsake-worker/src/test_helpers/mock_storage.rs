//! Mock storage provider for testing
//!
//! Behaves like a remote bucket with a local staging directory: the remote side
//! is an in-memory map, the staging side a temporary directory so external-tool
//! fakes can read and write real files.

use async_trait::async_trait;
use keepsake_core::models::Bucket;
use keepsake_storage::{
    ProviderResolver, StorageBackend, StorageError, StorageProvider, StorageResult,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub struct MockStorage {
    staging: TempDir,
    remote: Mutex<HashMap<String, Vec<u8>>>,
    released: Mutex<Vec<String>>,
    fail_staging: AtomicBool,
    fail_push: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            staging: TempDir::new().expect("create staging dir"),
            remote: Mutex::new(HashMap::new()),
            released: Mutex::new(Vec::new()),
            fail_staging: AtomicBool::new(false),
            fail_push: AtomicBool::new(false),
        }
    }

    fn local(&self, path: &str) -> PathBuf {
        self.staging.path().join(path)
    }

    pub fn put_remote(&self, path: &str, data: &[u8]) {
        self.remote
            .lock()
            .unwrap()
            .insert(path.to_string(), data.to_vec());
    }

    pub fn remote(&self, path: &str) -> Option<Vec<u8>> {
        self.remote.lock().unwrap().get(path).cloned()
    }

    pub fn local_exists(&self, path: &str) -> bool {
        self.local(path).exists()
    }

    /// Keys passed to `release_local_file`, in call order.
    pub fn released(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }

    pub fn fail_staging(&self, fail: bool) {
        self.fail_staging.store(fail, Ordering::SeqCst);
    }

    pub fn fail_push(&self, fail: bool) {
        self.fail_push.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl StorageProvider for MockStorage {
    async fn ensure_local_file(&self, path: &str) -> StorageResult<()> {
        if self.fail_staging.load(Ordering::SeqCst) {
            return Err(StorageError::DownloadFailed(format!("{}: injected", path)));
        }
        let local = self.local(path);
        if local.exists() {
            return Ok(());
        }
        let data = self
            .remote(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&local, data)?;
        Ok(())
    }

    async fn release_local_file(&self, path: &str) {
        self.released.lock().unwrap().push(path.to_string());
        let _ = std::fs::remove_file(self.local(path));
    }

    fn full_path(&self, path: &str) -> StorageResult<PathBuf> {
        Ok(self.local(path))
    }

    async fn load(
        &self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> StorageResult<u64> {
        let data = std::fs::read(self.local(path))
            .map_err(|_| StorageError::NotFound(path.to_string()))?;
        sink.write_all(&data).await?;
        Ok(data.len() as u64)
    }

    async fn update_remote_file(&self, path: &str, _mime_type: &str) -> StorageResult<()> {
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(StorageError::UploadFailed(format!("{}: injected", path)));
        }
        let data = std::fs::read(self.local(path))
            .map_err(|_| StorageError::NotFound(path.to_string()))?;
        self.put_remote(path, &data);
        Ok(())
    }

    async fn delete_remote_file(&self, path: &str) -> StorageResult<()> {
        self.remote.lock().unwrap().remove(path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> StorageResult<()> {
        match std::fs::remove_file(self.local(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, path: &str) -> StorageResult<u64> {
        if let Ok(meta) = std::fs::metadata(self.local(path)) {
            return Ok(meta.len());
        }
        self.remote(path)
            .map(|d| d.len() as u64)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn presigned_url(&self, path: &str, expires_in: Duration) -> StorageResult<String> {
        Ok(format!(
            "https://mock-bucket.local/{}?expires={}",
            path,
            expires_in.as_secs()
        ))
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

/// Resolves every bucket to the same mock provider, or fails every time.
pub struct MockResolver {
    provider: Option<Arc<MockStorage>>,
    resolutions: AtomicUsize,
}

impl MockResolver {
    pub fn new(provider: Arc<MockStorage>) -> Self {
        Self {
            provider: Some(provider),
            resolutions: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            provider: None,
            resolutions: AtomicUsize::new(0),
        }
    }

    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderResolver for MockResolver {
    async fn resolve(&self, bucket: &Bucket) -> StorageResult<Arc<dyn StorageProvider>> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        match &self.provider {
            Some(provider) => Ok(provider.clone() as Arc<dyn StorageProvider>),
            None => Err(StorageError::ConfigError(format!(
                "no provider for bucket {}",
                bucket.id
            ))),
        }
    }
}
