//! Face detection through an external engine.
//!
//! The engine is called with an image path and prints one JSON object:
//! `{"boxes": [[top, right, bottom, left], ...], "encodings": [[f32, ...], ...]}`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use keepsake_core::models::BoundingBox;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::command::{ToolCommand, ToolError};

/// Parallel lists: `encodings[i]` describes the face inside `boxes[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceDetection {
    pub boxes: Vec<BoundingBox>,
    pub encodings: Vec<Vec<f32>>,
}

impl FaceDetection {
    pub fn is_consistent(&self) -> bool {
        self.boxes.len() == self.encodings.len()
    }
}

#[async_trait]
pub trait FaceEngine: Send + Sync {
    async fn detect(&self, image: &Path) -> Result<FaceDetection>;
}

#[derive(Debug, Deserialize)]
struct EngineOutput {
    #[serde(default)]
    boxes: Vec<[i32; 4]>,
    #[serde(default)]
    encodings: Vec<Vec<f32>>,
}

pub struct CommandFaceEngine {
    program: PathBuf,
    timeout: Duration,
}

impl CommandFaceEngine {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

#[async_trait]
impl FaceEngine for CommandFaceEngine {
    #[tracing::instrument(skip(self), fields(image = %image.display()))]
    async fn detect(&self, image: &Path) -> Result<FaceDetection> {
        let mut command = ToolCommand::new(&self.program);
        command.arg(image.to_string_lossy()).timeout(self.timeout);
        let output = command.execute().await?;

        parse_engine_output(&output.stdout).map_err(|e| {
            ToolError::Output {
                tool: command.tool_name(),
                message: e.to_string(),
            }
            .into()
        })
    }
}

fn parse_engine_output(stdout: &str) -> Result<FaceDetection> {
    let parsed: EngineOutput =
        serde_json::from_str(stdout.trim()).context("Face engine output is not valid JSON")?;

    Ok(FaceDetection {
        boxes: parsed
            .boxes
            .into_iter()
            .map(|[top, right, bottom, left]| BoundingBox {
                top,
                right,
                bottom,
                left,
            })
            .collect(),
        encodings: parsed.encodings,
    })
}
