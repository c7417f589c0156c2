//! Keepsake enrichment worker
//!
//! A single sequential loop that picks up settled assets, stages their bytes,
//! runs the fixed task list against each one and records a terminal status per
//! task so no task ever runs twice for the same asset.

pub mod pipeline;
pub mod registry;
pub mod setup;
pub mod task;
pub mod tasks;

#[cfg(test)]
pub mod test_helpers;

pub use pipeline::{Pipeline, PipelineConfig};
pub use registry::{TaskDependencies, TaskRegistry};
pub use task::{Cleanup, EnrichmentTask, TaskOutcome};
