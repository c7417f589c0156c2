use async_trait::async_trait;
use keepsake_core::models::{Asset, GeoPoint};
use keepsake_core::TaskStatus;
use keepsake_db::AssetStore;
use keepsake_processing::{MetadataProbe, ProbeReport};
use keepsake_storage::StorageProvider;
use std::sync::Arc;

use crate::task::{EnrichmentTask, TaskOutcome};

/// Fills in dimensions and duration from the file itself, and backfills GPS when
/// the upload did not carry a location.
pub struct MetadataTask {
    assets: Arc<dyn AssetStore>,
    probe: Arc<dyn MetadataProbe>,
}

impl MetadataTask {
    pub fn new(assets: Arc<dyn AssetStore>, probe: Arc<dyn MetadataProbe>) -> Self {
        Self { assets, probe }
    }
}

fn apply_report(asset: &mut Asset, report: &ProbeReport) {
    if let Some(width) = report.width {
        asset.width = Some(width);
    }
    if let Some(height) = report.height {
        asset.height = Some(height);
    }
    if let Some(duration) = report.duration_secs {
        asset.duration_secs = Some(duration);
    }
    if asset.gps.is_none() {
        if let (Some(latitude), Some(longitude)) = (report.latitude, report.longitude) {
            asset.gps = Some(GeoPoint {
                latitude,
                longitude,
            });
        }
    }
}

#[async_trait]
impl EnrichmentTask for MetadataTask {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn should_handle(&self, asset: &Asset) -> bool {
        asset.dimensions_unknown() || (asset.is_video() && asset.duration_secs.is_none())
    }

    fn requires_content(&self, _asset: &Asset) -> bool {
        true
    }

    #[tracing::instrument(skip_all, fields(asset.id = asset.id))]
    async fn process(
        &self,
        asset: &mut Asset,
        storage: Option<Arc<dyn StorageProvider>>,
    ) -> TaskOutcome {
        let Some(storage) = storage else {
            return TaskStatus::FailedStorage.into();
        };

        let path = match storage.full_path(&asset.path) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot map asset key to a local path");
                return TaskStatus::Failed.into();
            }
        };

        let report = match self.probe.probe(&path).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(error = %e, "Metadata probe failed");
                return TaskStatus::Failed.into();
            }
        };

        apply_report(asset, &report);

        if let Err(e) = self.assets.save_enrichment(asset).await {
            tracing::warn!(error = %e, "Failed to save extracted metadata");
            return TaskStatus::FailedDb.into();
        }

        tracing::info!(
            width = ?asset.width,
            height = ?asset.height,
            duration_secs = ?asset.duration_secs,
            "Metadata extracted"
        );
        TaskStatus::Done.into()
    }
}
