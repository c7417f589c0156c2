//! Keepsake Core Library
//!
//! This crate provides the domain models, error types, configuration and the
//! per-asset task status codec shared by every Keepsake component.

pub mod config;
pub mod error;
pub mod models;
pub mod status;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, WorkerConfig};
pub use error::AppError;
pub use status::{RecordedStatus, TaskStatus, TaskStatusMap};
pub use storage_types::StorageBackend;
