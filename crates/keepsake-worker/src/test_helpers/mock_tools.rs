//! Fakes for the external utilities, the geocoder, and a configurable task.
//!
//! Tool fakes write real files at the requested output paths so storage size
//! checks and uploads behave as they would after a real run.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use keepsake_core::models::{Asset, GeoPoint};
use keepsake_core::TaskStatus;
use keepsake_processing::{
    Address, FaceDetection, FaceEngine, FrameExtractor, FrameInfo, Geocoder, MetadataProbe,
    ProbeReport, Transcoder,
};
use keepsake_storage::{SignedUrlCache, StorageProvider};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::task::{EnrichmentTask, TaskOutcome};

fn write_output(output: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, data)?;
    Ok(())
}

pub struct MockProbe {
    report: Mutex<Option<ProbeReport>>,
    calls: AtomicUsize,
}

impl MockProbe {
    pub fn returning(report: ProbeReport) -> Self {
        Self {
            report: Mutex::new(Some(report)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            report: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProbe for MockProbe {
    async fn probe(&self, _path: &Path) -> Result<ProbeReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.report
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("exiftool: exited with status 1"))
    }
}

#[derive(Default)]
pub struct MockTranscoder {
    fail: AtomicBool,
    empty_output: AtomicBool,
    calls: AtomicUsize,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn produce_empty(&self, empty: bool) {
        self.empty_output.store(empty, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !input.exists() {
            return Err(anyhow!("ffmpeg: {} not found", input.display()));
        }
        if self.fail.load(Ordering::SeqCst) {
            write_output(output, b"partial")?;
            return Err(anyhow!("ffmpeg: exited with status 1: invalid data"));
        }
        if self.empty_output.load(Ordering::SeqCst) {
            write_output(output, b"")
        } else {
            write_output(output, b"normalized-mp4-bytes")
        }
    }
}

pub struct MockFrameExtractor {
    width: u32,
    height: u32,
    fail: AtomicBool,
}

impl MockFrameExtractor {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FrameExtractor for MockFrameExtractor {
    async fn extract(&self, _input: &Path, output: &Path, max_width: u32) -> Result<FrameInfo> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("ffmpeg: no video stream"));
        }
        write_output(output, b"jpeg-thumbnail-bytes")?;
        Ok(FrameInfo {
            width: self.width.min(max_width),
            height: self.height,
        })
    }
}

pub struct MockFaceEngine {
    detection: FaceDetection,
    fail: AtomicBool,
    calls: AtomicUsize,
    last_image: Mutex<Option<PathBuf>>,
}

impl MockFaceEngine {
    pub fn returning(detection: FaceDetection) -> Self {
        Self {
            detection,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last_image: Mutex::new(None),
        }
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_image(&self) -> Option<PathBuf> {
        self.last_image.lock().unwrap().clone()
    }
}

#[async_trait]
impl FaceEngine for MockFaceEngine {
    async fn detect(&self, image: &Path) -> Result<FaceDetection> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_image.lock().unwrap() = Some(image.to_path_buf());
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow!("face engine crashed"));
        }
        if !image.exists() {
            return Err(anyhow!("{} not found", image.display()));
        }
        Ok(self.detection.clone())
    }
}

pub struct MockGeocoder {
    answer: Option<Address>,
    fail: bool,
    calls: AtomicUsize,
}

impl MockGeocoder {
    /// A geocoder with no answer for any point.
    pub fn new() -> Self {
        Self {
            answer: None,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn answering(address: Address) -> Self {
        Self {
            answer: Some(address),
            ..Self::new()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn resolve(&self, _point: GeoPoint) -> Result<Option<Address>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("503 Service Unavailable"));
        }
        Ok(self.answer.clone())
    }
}

/// Every external collaborator of the standard tasks, with happy-path defaults.
pub struct MockTools {
    pub geocoder: Arc<MockGeocoder>,
    pub probe: Arc<MockProbe>,
    pub transcoder: Arc<MockTranscoder>,
    pub frames: Arc<MockFrameExtractor>,
    pub face_engine: Arc<MockFaceEngine>,
    pub url_cache: Arc<SignedUrlCache>,
}

impl MockTools {
    pub fn new() -> Self {
        Self {
            geocoder: Arc::new(MockGeocoder::answering(super::paris_address())),
            probe: Arc::new(MockProbe::returning(ProbeReport {
                latitude: None,
                longitude: None,
                width: Some(1920),
                height: Some(1080),
                duration_secs: Some(13),
            })),
            transcoder: Arc::new(MockTranscoder::new()),
            frames: Arc::new(MockFrameExtractor::new(720, 405)),
            face_engine: Arc::new(MockFaceEngine::returning(super::two_faces())),
            url_cache: super::url_cache(),
        }
    }
}

/// A task with a fixed outcome that counts its invocations.
pub struct NamedTask {
    name: &'static str,
    status: TaskStatus,
    applies: bool,
    needs_content: bool,
    calls: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl NamedTask {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            status: TaskStatus::Done,
            applies: true,
            needs_content: false,
            calls: Arc::new(AtomicUsize::new(0)),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn returning(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn needing_content(mut self) -> Self {
        self.needs_content = true;
        self
    }

    pub fn not_applicable(mut self) -> Self {
        self.applies = false;
        self
    }

    /// Shared invocation counter, usable after the task moved into a registry.
    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    /// Asset names the task was handed, one per invocation.
    pub fn seen_names(&self) -> Arc<Mutex<Vec<String>>> {
        self.seen.clone()
    }
}

#[async_trait]
impl EnrichmentTask for NamedTask {
    fn name(&self) -> &'static str {
        self.name
    }

    fn should_handle(&self, _asset: &Asset) -> bool {
        self.applies
    }

    fn requires_content(&self, _asset: &Asset) -> bool {
        self.needs_content
    }

    async fn process(
        &self,
        asset: &mut Asset,
        _storage: Option<Arc<dyn StorageProvider>>,
    ) -> TaskOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(asset.name.clone());
        // Visible mutation so tests can tell whether the pipeline kept the copy.
        asset.name = format!("{}+{}", asset.name, self.name);
        TaskOutcome::new(self.status)
    }
}
