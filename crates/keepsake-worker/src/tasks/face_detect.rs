use async_trait::async_trait;
use keepsake_core::models::{Asset, NewFace};
use keepsake_core::TaskStatus;
use keepsake_db::FaceStore;
use keepsake_processing::FaceEngine;
use keepsake_storage::StorageProvider;
use std::sync::Arc;

use crate::task::{Cleanup, EnrichmentTask, TaskOutcome};

/// Detects faces on the thumbnail, so it must run after the thumbnail task.
///
/// Faces already written stay in place when a later insert fails; the task is
/// never retried, so there is no duplicate to guard against.
pub struct FaceDetectTask {
    faces: Arc<dyn FaceStore>,
    engine: Arc<dyn FaceEngine>,
}

impl FaceDetectTask {
    pub fn new(faces: Arc<dyn FaceStore>, engine: Arc<dyn FaceEngine>) -> Self {
        Self { faces, engine }
    }

    async fn detect_and_store(
        &self,
        asset: &Asset,
        storage: &dyn StorageProvider,
        thumb_path: &str,
    ) -> TaskStatus {
        if let Err(e) = storage.ensure_local_file(thumb_path).await {
            tracing::warn!(key = %thumb_path, error = %e, "Failed to stage thumbnail");
            return TaskStatus::FailedStorage;
        }

        let image = match storage.full_path(thumb_path) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(key = %thumb_path, error = %e, "Cannot map thumbnail key");
                return TaskStatus::FailedStorage;
            }
        };

        let detection = match self.engine.detect(&image).await {
            Ok(detection) => detection,
            Err(e) => {
                tracing::warn!(error = %e, "Face detection failed");
                return TaskStatus::Failed;
            }
        };

        if !detection.is_consistent() {
            tracing::warn!(
                boxes = detection.boxes.len(),
                encodings = detection.encodings.len(),
                "Face engine returned mismatched lists"
            );
            return TaskStatus::Failed;
        }

        let count = detection.boxes.len();
        for (seq, (bounding_box, encoding)) in detection
            .boxes
            .into_iter()
            .zip(detection.encodings)
            .enumerate()
        {
            let face = NewFace {
                asset_id: asset.id,
                seq: seq as i32,
                bounding_box,
                encoding,
            };
            if let Err(e) = self.faces.insert_face(&face).await {
                tracing::warn!(seq, error = %e, "Failed to store face, abandoning remaining faces");
                return TaskStatus::FailedDb;
            }
        }

        tracing::info!(faces = count, "Face detection complete");
        TaskStatus::Done
    }
}

#[async_trait]
impl EnrichmentTask for FaceDetectTask {
    fn name(&self) -> &'static str {
        "facedetect"
    }

    fn should_handle(&self, _asset: &Asset) -> bool {
        true
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
        let Some(thumbnail) = asset.thumbnail.as_ref() else {
            tracing::info!("No thumbnail to run face detection on");
            return TaskStatus::Failed.into();
        };
        let Some(storage) = storage else {
            return TaskStatus::FailedStorage.into();
        };

        let thumb_path = thumbnail.path.clone();
        let status = self
            .detect_and_store(asset, storage.as_ref(), &thumb_path)
            .await;
        TaskOutcome::new(status).with_cleanup(Cleanup::release(storage, thumb_path))
    }
}
