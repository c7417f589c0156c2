//! Re-encode videos into the normalized container so every client can play
//! them, then swap the asset over to the new file.

use async_trait::async_trait;
use keepsake_core::models::Asset;
use keepsake_core::TaskStatus;
use keepsake_db::AssetStore;
use keepsake_processing::{Transcoder, NORMALIZED_EXTENSION, NORMALIZED_MIME};
use keepsake_storage::StorageProvider;
use std::path::Path;
use std::sync::Arc;

use crate::task::{Cleanup, EnrichmentTask, TaskOutcome};

pub struct VideoTask {
    assets: Arc<dyn AssetStore>,
    transcoder: Arc<dyn Transcoder>,
}

/// Key of the normalized copy: same directory and stem, normalized extension.
/// A source that already carries that extension gets a `.normalized` infix.
pub fn normalized_path(path: &str) -> String {
    let original = Path::new(path);
    let candidate = original.with_extension(NORMALIZED_EXTENSION);
    if candidate != original {
        return candidate.to_string_lossy().into_owned();
    }
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    original
        .with_file_name(format!("{}.normalized.{}", stem, NORMALIZED_EXTENSION))
        .to_string_lossy()
        .into_owned()
}

fn normalized_name(name: &str) -> String {
    Path::new(name)
        .with_extension(NORMALIZED_EXTENSION)
        .to_string_lossy()
        .into_owned()
}

impl VideoTask {
    pub fn new(assets: Arc<dyn AssetStore>, transcoder: Arc<dyn Transcoder>) -> Self {
        Self { assets, transcoder }
    }

    /// Drop the local output of an attempt that will not be committed.
    async fn discard_output(storage: &dyn StorageProvider, path: &str) {
        if let Err(e) = storage.delete(path).await {
            tracing::warn!(key = %path, error = %e, "Failed to remove abandoned transcode output");
        }
    }

    async fn normalize(
        &self,
        asset: &mut Asset,
        storage: &dyn StorageProvider,
        new_path: &str,
    ) -> TaskStatus {
        let (input, output) = match (storage.full_path(&asset.path), storage.full_path(new_path)) {
            (Ok(input), Ok(output)) => (input, output),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Cannot map video keys to local paths");
                return TaskStatus::Failed;
            }
        };

        if let Err(e) = self.transcoder.transcode(&input, &output).await {
            tracing::warn!(error = %e, "Video transcode failed");
            Self::discard_output(storage, new_path).await;
            return TaskStatus::Failed;
        }

        let size = match storage.size(new_path).await {
            Ok(size) if size > 0 => size,
            Ok(_) => {
                tracing::warn!(key = %new_path, "Transcoder produced an empty file");
                Self::discard_output(storage, new_path).await;
                return TaskStatus::Failed;
            }
            Err(e) => {
                tracing::warn!(key = %new_path, error = %e, "Transcoded file missing");
                Self::discard_output(storage, new_path).await;
                return TaskStatus::Failed;
            }
        };

        if let Err(e) = storage.update_remote_file(new_path, NORMALIZED_MIME).await {
            tracing::warn!(key = %new_path, error = %e, "Failed to upload normalized video");
            Self::discard_output(storage, new_path).await;
            return TaskStatus::Failed;
        }

        let old_path = std::mem::replace(&mut asset.path, new_path.to_string());
        asset.name = normalized_name(&asset.name);
        asset.mime_type = NORMALIZED_MIME.to_string();
        asset.size = size as i64;

        if let Err(e) = self.assets.save_enrichment(asset).await {
            tracing::warn!(error = %e, "Failed to save normalized video fields");
            if let Err(e) = storage.delete_remote_file(new_path).await {
                tracing::warn!(key = %new_path, error = %e, "Failed to remove orphaned remote video");
            }
            Self::discard_output(storage, new_path).await;
            return TaskStatus::FailedDb;
        }

        // The asset now points at the new file; leftovers of the old one only
        // cost space, so failures here do not change the outcome.
        if let Err(e) = storage.delete_remote_file(&old_path).await {
            tracing::warn!(key = %old_path, error = %e, "Failed to delete original remote video");
        }
        if let Err(e) = storage.delete(&old_path).await {
            tracing::warn!(key = %old_path, error = %e, "Failed to delete original local video");
        }

        tracing::info!(from = %old_path, to = %new_path, size, "Video normalized");
        TaskStatus::Done
    }
}

#[async_trait]
impl EnrichmentTask for VideoTask {
    fn name(&self) -> &'static str {
        "video"
    }

    fn should_handle(&self, asset: &Asset) -> bool {
        asset.is_video() && asset.mime_type != NORMALIZED_MIME
    }

    fn requires_content(&self, asset: &Asset) -> bool {
        !asset.owner.preferences.skip_video_conversion
    }

    #[tracing::instrument(skip_all, fields(asset.id = asset.id))]
    async fn process(
        &self,
        asset: &mut Asset,
        storage: Option<Arc<dyn StorageProvider>>,
    ) -> TaskOutcome {
        if asset.owner.preferences.skip_video_conversion {
            tracing::debug!("Owner opted out of video conversion");
            return TaskStatus::UserSkipped.into();
        }
        let Some(storage) = storage else {
            return TaskStatus::FailedStorage.into();
        };

        let new_path = normalized_path(&asset.path);
        let status = self.normalize(asset, storage.as_ref(), &new_path).await;
        TaskOutcome::new(status).with_cleanup(Cleanup::release(storage, new_path))
    }
}
