//! Storage provider abstraction
//!
//! This module defines the `StorageProvider` trait every bucket backend implements.

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncWrite;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage provider for one bucket.
///
/// "Local" operations act on the staged copy of a key on the worker's disk;
/// "remote" operations act on the bucket's authoritative store. For local-disk
/// buckets both are the same file and the remote operations are no-ops.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Make sure a local copy of `path` exists, downloading it if needed.
    async fn ensure_local_file(&self, path: &str) -> StorageResult<()>;

    /// Drop the local copy of `path` if it is only a staged copy. Never fails.
    async fn release_local_file(&self, path: &str);

    /// Absolute path of the local copy of `path`.
    fn full_path(&self, path: &str) -> StorageResult<PathBuf>;

    /// Stream the local copy of `path` into `sink`, returning the bytes written.
    async fn load(
        &self,
        path: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> StorageResult<u64>;

    /// Push the local copy of `path` to the remote store.
    async fn update_remote_file(&self, path: &str, mime_type: &str) -> StorageResult<()>;

    /// Delete the remote object for `path`.
    async fn delete_remote_file(&self, path: &str) -> StorageResult<()>;

    /// Delete the local copy of `path`.
    async fn delete(&self, path: &str) -> StorageResult<()>;

    /// Size in bytes of the local copy of `path`.
    async fn size(&self, path: &str) -> StorageResult<u64>;

    /// Temporary GET URL for `path`.
    async fn presigned_url(&self, path: &str, expires_in: Duration) -> StorageResult<String>;

    fn backend_type(&self) -> StorageBackend;
}
