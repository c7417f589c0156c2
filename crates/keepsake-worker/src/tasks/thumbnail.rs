//! Thumbnail generation.
//!
//! Thumbnail fields are written as a set and only once the file is in the
//! bucket: either all of path, size and dimensions describe a pushed file, or
//! the thumbnail is absent.

use async_trait::async_trait;
use keepsake_core::models::{Asset, Thumbnail};
use keepsake_core::TaskStatus;
use keepsake_db::AssetStore;
use keepsake_processing::FrameExtractor;
use keepsake_storage::{SignedUrlCache, StorageProvider};
use std::path::Path;
use std::sync::Arc;

use crate::task::{Cleanup, EnrichmentTask, TaskOutcome};

pub const THUMBNAIL_MIME: &str = "image/jpeg";

/// `photos/beach.heic` -> `photos/beach.thumb.jpg`
pub fn thumbnail_path(path: &str) -> String {
    let original = Path::new(path);
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    original
        .with_file_name(format!("{}.thumb.jpg", stem))
        .to_string_lossy()
        .into_owned()
}

pub struct ThumbnailTask {
    assets: Arc<dyn AssetStore>,
    frames: Arc<dyn FrameExtractor>,
    url_cache: Arc<SignedUrlCache>,
    max_width: u32,
}

impl ThumbnailTask {
    pub fn new(
        assets: Arc<dyn AssetStore>,
        frames: Arc<dyn FrameExtractor>,
        url_cache: Arc<SignedUrlCache>,
        max_width: u32,
    ) -> Self {
        Self {
            assets,
            frames,
            url_cache,
            max_width,
        }
    }

    async fn generate(
        &self,
        asset: &mut Asset,
        storage: &dyn StorageProvider,
        thumb_path: &str,
    ) -> TaskStatus {
        let (input, output) = match (storage.full_path(&asset.path), storage.full_path(thumb_path))
        {
            (Ok(input), Ok(output)) => (input, output),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, "Cannot map thumbnail keys to local paths");
                return TaskStatus::Failed;
            }
        };

        let frame = match self.frames.extract(&input, &output, self.max_width).await {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Frame extraction failed");
                return TaskStatus::Failed;
            }
        };

        let size = match storage.size(thumb_path).await {
            Ok(size) if size > 0 => size,
            Ok(_) => {
                tracing::warn!(key = %thumb_path, "Frame extractor produced an empty thumbnail");
                return TaskStatus::Failed;
            }
            Err(e) => {
                tracing::warn!(key = %thumb_path, error = %e, "Thumbnail missing after extraction");
                return TaskStatus::Failed;
            }
        };

        if let Err(e) = storage.update_remote_file(thumb_path, THUMBNAIL_MIME).await {
            tracing::warn!(key = %thumb_path, error = %e, "Thumbnail upload failed");
            return TaskStatus::Failed;
        }
        self.url_cache.invalidate(asset.bucket.id, thumb_path);

        asset.thumbnail = Some(Thumbnail {
            path: thumb_path.to_string(),
            width: frame.width as i32,
            height: frame.height as i32,
            size: size as i64,
        });

        if let Err(e) = self.assets.save_enrichment(asset).await {
            tracing::warn!(error = %e, "Failed to save thumbnail fields, removing pushed thumbnail");
            asset.thumbnail = None;
            if let Err(e) = storage.delete_remote_file(thumb_path).await {
                tracing::error!(key = %thumb_path, error = %e, "Failed to remove orphaned thumbnail");
            }
            return TaskStatus::FailedDb;
        }

        tracing::info!(
            key = %thumb_path,
            width = frame.width,
            height = frame.height,
            size,
            "Thumbnail generated"
        );
        TaskStatus::Done
    }
}

#[async_trait]
impl EnrichmentTask for ThumbnailTask {
    fn name(&self) -> &'static str {
        "thumb"
    }

    fn should_handle(&self, asset: &Asset) -> bool {
        asset.thumbnail.is_none()
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

        let thumb_path = thumbnail_path(&asset.path);
        let status = self.generate(asset, storage.as_ref(), &thumb_path).await;
        let cleanup = if status == TaskStatus::Done {
            Cleanup::release(storage, thumb_path)
        } else {
            Cleanup::discard(storage, thumb_path)
        };
        TaskOutcome::new(status).with_cleanup(cleanup)
    }
}
