//! The enrichment pipeline loop.
//!
//! Each pass selects assets that still lack a status for some registered task,
//! runs the missing tasks in registry order and records one terminal status per
//! task. A recorded status is never revisited, whatever its value.

use anyhow::Result;
use keepsake_core::models::Asset;
use keepsake_core::{Config, TaskStatus};
use keepsake_db::{AssetStore, StatusStore};
use keepsake_storage::{ProviderResolver, StorageProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::registry::TaskRegistry;

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Sleep between passes.
    pub poll_interval: Duration,
    /// Minimum time since an asset's last update before it is picked up, so an
    /// upload still in flight is left alone.
    pub debounce: Duration,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            debounce: config.debounce(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            debounce: Duration::from_secs(30),
        }
    }
}

pub struct Pipeline {
    registry: Arc<TaskRegistry>,
    assets: Arc<dyn AssetStore>,
    statuses: Arc<dyn StatusStore>,
    storage: Arc<dyn ProviderResolver>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        registry: Arc<TaskRegistry>,
        assets: Arc<dyn AssetStore>,
        statuses: Arc<dyn StatusStore>,
        storage: Arc<dyn ProviderResolver>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            registry,
            assets,
            statuses,
            storage,
            config,
        }
    }

    /// Run passes forever. A failed pass is logged and retried after the
    /// regular poll interval.
    pub async fn run(&self) {
        tracing::info!(
            tasks = ?self.registry.names(),
            poll_interval_secs = self.config.poll_interval.as_secs(),
            debounce_secs = self.config.debounce.as_secs(),
            "Enrichment pipeline started"
        );

        loop {
            match self.run_pass().await {
                Ok(0) => tracing::trace!("No assets to enrich"),
                Ok(processed) => tracing::info!(processed, "Pipeline pass complete"),
                Err(e) => tracing::error!(error = %e, "Pipeline pass aborted"),
            }
            sleep(self.config.poll_interval).await;
        }
    }

    /// One pass over every current candidate. Returns the number of assets
    /// visited. Store errors abort the pass.
    pub async fn run_pass(&self) -> Result<usize> {
        let names = self.registry.names();
        // Collected up front so no cursor stays open while tasks write.
        let candidates = self
            .assets
            .candidate_ids(&names, self.config.debounce)
            .await?;

        for &id in &candidates {
            self.process_asset(id).await?;
        }
        Ok(candidates.len())
    }

    #[tracing::instrument(skip(self), fields(asset.id = id))]
    pub async fn process_asset(&self, id: i64) -> Result<()> {
        let Some(asset) = self.assets.load(id).await? else {
            tracing::warn!("Candidate asset disappeared before processing");
            return Ok(());
        };
        let mut statuses = self.statuses.load(id).await?;

        let pending: Vec<_> = self
            .registry
            .iter()
            .filter(|task| !statuses.contains(task.name()))
            .cloned()
            .collect();
        if pending.is_empty() {
            return Ok(());
        }

        let needs_content = pending
            .iter()
            .any(|task| task.should_handle(&asset) && task.requires_content(&asset));
        let staged_path = asset.path.clone();
        let storage = if needs_content {
            self.stage(&asset).await
        } else {
            None
        };

        let mut current = asset;
        let mut cleanups = Vec::new();

        for task in &pending {
            let status = if !task.should_handle(&current) {
                TaskStatus::Skipped
            } else if task.requires_content(&current) && storage.is_none() {
                TaskStatus::FailedStorage
            } else {
                let mut candidate = current.clone();
                let outcome = task.process(&mut candidate, storage.clone()).await;
                cleanups.extend(outcome.cleanup);
                if outcome.status == TaskStatus::Done {
                    current = candidate;
                }
                outcome.status
            };

            tracing::info!(task = task.name(), status = %status, "Task finished");
            statuses.record(task.name(), status);
        }

        for cleanup in cleanups {
            cleanup.run().await;
        }
        if let Some(storage) = &storage {
            storage.release_local_file(&staged_path).await;
        }

        self.statuses.save(id, &statuses).await?;
        tracing::debug!(statuses = %statuses.encode(), "Asset statuses saved");
        Ok(())
    }

    /// Resolve the asset's bucket and stage its primary file. `None` when either
    /// step fails; tasks needing content then record a storage failure.
    async fn stage(&self, asset: &Asset) -> Option<Arc<dyn StorageProvider>> {
        let provider = match self.storage.resolve(&asset.bucket).await {
            Ok(provider) => provider,
            Err(e) => {
                tracing::warn!(bucket.id = asset.bucket.id, error = %e, "Failed to resolve storage provider");
                return None;
            }
        };

        match provider.ensure_local_file(&asset.path).await {
            Ok(()) => Some(provider),
            Err(e) => {
                tracing::warn!(key = %asset.path, error = %e, "Failed to stage asset content");
                provider.release_local_file(&asset.path).await;
                None
            }
        }
    }
}
