//! Builder for running external utilities with a bounded execution time.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{tool}: failed to spawn: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool}: timed out after {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("{tool}: exited with status {status}: {stderr}")]
    Failed {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{tool}: unexpected output: {message}")]
    Output { tool: String, message: String },
}

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    /// Standard output, lossy UTF-8.
    pub stdout: String,
    pub stderr: String,
}

/// A single invocation of an external program.
///
/// The child is killed when the timeout elapses, so a hung utility cannot stall
/// the caller forever.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Short name of the program, used in errors and spans.
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Run the program to completion, capturing stdout and stderr.
    ///
    /// # Errors
    ///
    /// Fails when the program cannot be spawned, outlives the timeout, or exits
    /// with a non-zero status (stderr is included in the error).
    pub async fn execute(&self) -> Result<ToolOutput, ToolError> {
        let tool = self.tool_name();
        tracing::debug!(tool = %tool, args = ?self.args, "Running external tool");

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ToolError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => return Err(ToolError::Spawn { tool, source }),
            Err(_) => {
                return Err(ToolError::Timeout {
                    tool,
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool,
                status: output.status,
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(ToolOutput {
            status: output.status,
            stdout,
            stderr,
        })
    }
}
