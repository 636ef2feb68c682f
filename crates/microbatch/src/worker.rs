//! Ownership of the background dispatch task.

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::error;

/// Handle to the dispatch loop task.
///
/// The dispatcher's lifecycle owns the task explicitly: construction spawns
/// it, [`join`](WorkerHandle::join) awaits its exit during shutdown. There is
/// no process-wide worker.
pub(crate) struct WorkerHandle {
    /// Becomes `None` once the task has been joined.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerHandle {
    pub(crate) fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Waits for the dispatch task to exit. Subsequent calls return
    /// immediately.
    ///
    /// A panicked task surfaces here as a join error; by that point every
    /// pending result slot has been dropped, so waiting callers observe
    /// `Closed` rather than hanging.
    pub(crate) async fn join(&self) {
        let handle = self.handle.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(error = %err, "dispatch loop task failed");
            }
        }
    }
}
