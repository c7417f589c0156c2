//! Representative-frame extraction for thumbnails.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::ToolCommand;

/// Pixel dimensions of an extracted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Write one representative frame of `input` to `output`, no wider than
    /// `max_width`, and report its dimensions.
    async fn extract(&self, input: &Path, output: &Path, max_width: u32) -> Result<FrameInfo>;
}

pub struct FfmpegFrameExtractor {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegFrameExtractor {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    #[tracing::instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    async fn extract(&self, input: &Path, output: &Path, max_width: u32) -> Result<FrameInfo> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // `thumbnail` picks the most representative frame of a batch; for a still
        // image it is the image itself.
        ToolCommand::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(input.to_string_lossy())
            .arg("-vf")
            .arg(format!("thumbnail,scale='min({},iw)':-2", max_width))
            .args(["-frames:v", "1"])
            .arg(output.to_string_lossy())
            .timeout(self.timeout)
            .execute()
            .await?;

        let path = output.to_path_buf();
        let (width, height) = tokio::task::spawn_blocking(move || image::image_dimensions(&path))
            .await
            .context("Frame dimension task panicked")?
            .context("Failed to read extracted frame")?;

        Ok(FrameInfo { width, height })
    }
}
