//! Video normalization to H.264/AAC in an MP4 container.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::ToolCommand;

/// Mime type of a normalized video.
pub const NORMALIZED_MIME: &str = "video/mp4";
pub const NORMALIZED_EXTENSION: &str = "mp4";

#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Write a normalized copy of `input` to `output`.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    #[tracing::instrument(skip(self), fields(input = %input.display(), output = %output.display()))]
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        ToolCommand::new(&self.ffmpeg_path)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(input.to_string_lossy())
            .args([
                "-c:v",
                "libx264",
                "-preset",
                "fast",
                "-profile:v",
                "main",
                "-pix_fmt",
                "yuv420p",
                "-c:a",
                "aac",
                "-b:a",
                "128k",
                "-movflags",
                "+faststart",
            ])
            .arg(output.to_string_lossy())
            .timeout(self.timeout)
            .execute()
            .await?;

        tracing::info!("Video transcoded");
        Ok(())
    }
}
