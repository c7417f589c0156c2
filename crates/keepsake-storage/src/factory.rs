#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{StorageBackend, StorageError, StorageProvider, StorageResult};
use async_trait::async_trait;
use keepsake_core::models::Bucket;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Resolves the storage provider for an asset's bucket.
#[async_trait]
pub trait ProviderResolver: Send + Sync {
    async fn resolve(&self, bucket: &Bucket) -> StorageResult<Arc<dyn StorageProvider>>;
}

/// Create a storage provider for one bucket row.
pub async fn create_provider(
    bucket: &Bucket,
    staging_dir: &Path,
) -> StorageResult<Arc<dyn StorageProvider>> {
    match bucket.backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let name = bucket.s3_bucket.clone().ok_or_else(|| {
                StorageError::ConfigError(format!("Bucket {} has no s3_bucket", bucket.id))
            })?;
            let region = bucket.s3_region.clone().ok_or_else(|| {
                StorageError::ConfigError(format!("Bucket {} has no s3_region", bucket.id))
            })?;
            let staging_root = staging_dir.join(bucket.id.to_string());

            let storage =
                S3Storage::new(name, region, bucket.s3_endpoint.clone(), staging_root).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = bucket.local_path.clone().ok_or_else(|| {
                StorageError::ConfigError(format!("Bucket {} has no local_path", bucket.id))
            })?;
            let base_url = bucket
                .base_url
                .clone()
                .unwrap_or_else(|| format!("file://{}", base_path.trim_end_matches('/')));

            let storage = LocalStorage::new(base_path, base_url).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

/// Builds providers on first use and reuses them for later assets in the same
/// bucket.
pub struct StorageFactory {
    staging_dir: PathBuf,
    providers: Mutex<HashMap<i64, Arc<dyn StorageProvider>>>,
}

impl StorageFactory {
    pub fn new(staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            providers: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl ProviderResolver for StorageFactory {
    async fn resolve(&self, bucket: &Bucket) -> StorageResult<Arc<dyn StorageProvider>> {
        let mut providers = self.providers.lock().await;
        if let Some(provider) = providers.get(&bucket.id) {
            return Ok(provider.clone());
        }

        let provider = create_provider(bucket, &self.staging_dir).await?;
        tracing::info!(
            bucket.id = bucket.id,
            bucket.name = %bucket.name,
            backend = %bucket.backend,
            "Storage provider created"
        );
        providers.insert(bucket.id, provider.clone());
        Ok(provider)
    }
}
