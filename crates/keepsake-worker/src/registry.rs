//! The ordered, immutable list of tasks a pipeline runs.
//!
//! Order matters: later tasks observe the committed results of earlier ones in
//! the same pass (face detection reads the thumbnail produced just before it).

use anyhow::{bail, Result};
use keepsake_db::{AssetStore, FaceStore, LocationStore, PlaceStore};
use keepsake_processing::{FaceEngine, FrameExtractor, Geocoder, MetadataProbe, Transcoder};
use keepsake_storage::SignedUrlCache;
use std::collections::HashSet;
use std::sync::Arc;

use crate::task::EnrichmentTask;
use crate::tasks::{FaceDetectTask, LocationTask, MetadataTask, ThumbnailTask, VideoTask};

/// Collaborators the standard tasks are built from.
#[derive(Clone)]
pub struct TaskDependencies {
    pub assets: Arc<dyn AssetStore>,
    pub locations: Arc<dyn LocationStore>,
    pub places: Arc<dyn PlaceStore>,
    pub faces: Arc<dyn FaceStore>,
    pub geocoder: Arc<dyn Geocoder>,
    pub probe: Arc<dyn MetadataProbe>,
    pub transcoder: Arc<dyn Transcoder>,
    pub frames: Arc<dyn FrameExtractor>,
    pub face_engine: Arc<dyn FaceEngine>,
    pub url_cache: Arc<SignedUrlCache>,
    pub thumbnail_max_width: u32,
}

pub struct TaskRegistry {
    tasks: Vec<Arc<dyn EnrichmentTask>>,
}

impl TaskRegistry {
    /// Build a registry from tasks in execution order.
    ///
    /// Task names end up in the status payload, so they must be unique, non-empty,
    /// free of the payload delimiters and free of surrounding whitespace (decoding
    /// trims names).
    pub fn new(tasks: Vec<Arc<dyn EnrichmentTask>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for task in &tasks {
            let name = task.name();
            if name.is_empty() || name.trim() != name || name.contains([':', ',']) {
                bail!("Invalid task name {:?}", name);
            }
            if !seen.insert(name) {
                bail!("Task {:?} registered twice", name);
            }
        }
        Ok(Self { tasks })
    }

    /// location, video, metadata, thumb, facedetect
    pub fn standard(deps: TaskDependencies) -> Result<Self> {
        Self::new(vec![
            Arc::new(LocationTask::new(
                deps.assets.clone(),
                deps.locations,
                deps.places,
                deps.geocoder,
            )),
            Arc::new(VideoTask::new(deps.assets.clone(), deps.transcoder)),
            Arc::new(MetadataTask::new(deps.assets.clone(), deps.probe)),
            Arc::new(ThumbnailTask::new(
                deps.assets,
                deps.frames,
                deps.url_cache,
                deps.thumbnail_max_width,
            )),
            Arc::new(FaceDetectTask::new(deps.faces, deps.face_engine)),
        ])
    }

    pub fn names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EnrichmentTask>> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
