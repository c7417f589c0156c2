//! The contract every enrichment task implements.

use async_trait::async_trait;
use keepsake_core::models::Asset;
use keepsake_core::TaskStatus;
use keepsake_storage::StorageProvider;
use std::sync::Arc;

/// Disposes of a local file a task staged or produced. Runs after every task of
/// the pass has finished.
///
/// A released file is only a staged copy and is dropped when the backend keeps
/// staged copies apart from the bucket. A discarded file is an output that was
/// never committed and is deleted on every backend, local buckets included.
pub struct Cleanup {
    storage: Arc<dyn StorageProvider>,
    path: String,
    discard: bool,
}

impl Cleanup {
    pub fn release(storage: Arc<dyn StorageProvider>, path: impl Into<String>) -> Self {
        Self {
            storage,
            path: path.into(),
            discard: false,
        }
    }

    pub fn discard(storage: Arc<dyn StorageProvider>, path: impl Into<String>) -> Self {
        Self {
            discard: true,
            ..Self::release(storage, path)
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn discards(&self) -> bool {
        self.discard
    }

    pub async fn run(self) {
        if self.discard {
            if let Err(e) = self.storage.delete(&self.path).await {
                tracing::warn!(key = %self.path, error = %e, "Failed to discard uncommitted output");
            }
        } else {
            self.storage.release_local_file(&self.path).await;
        }
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleanup")
            .field("path", &self.path)
            .field("discard", &self.discard)
            .finish()
    }
}

#[derive(Debug)]
pub struct TaskOutcome {
    pub status: TaskStatus,
    pub cleanup: Option<Cleanup>,
}

impl TaskOutcome {
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            cleanup: None,
        }
    }

    pub fn with_cleanup(mut self, cleanup: Cleanup) -> Self {
        self.cleanup = Some(cleanup);
        self
    }
}

impl From<TaskStatus> for TaskOutcome {
    fn from(status: TaskStatus) -> Self {
        Self::new(status)
    }
}

/// One step of the enrichment pipeline.
///
/// `process` receives a private copy of the asset. The pipeline keeps the
/// mutated copy only when the task returns `Done`, so a task may leave the copy
/// in any state on failure. A task that changes asset fields persists them
/// itself before reporting `Done`.
#[async_trait]
pub trait EnrichmentTask: Send + Sync {
    /// Key of the task in the status map. Must not contain `:` or `,` nor start
    /// or end with whitespace.
    fn name(&self) -> &'static str;

    /// Whether the task applies to the asset. Pure, no I/O.
    fn should_handle(&self, asset: &Asset) -> bool;

    /// Whether `process` needs the asset's primary file staged locally.
    fn requires_content(&self, asset: &Asset) -> bool;

    async fn process(
        &self,
        asset: &mut Asset,
        storage: Option<Arc<dyn StorageProvider>>,
    ) -> TaskOutcome;
}
