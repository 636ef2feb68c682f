use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::{Mutex, oneshot};
use tracing::{debug, trace};

use crate::batch::dispatch_loop;
use crate::communication::{Item, QueueItem};
use crate::config::DispatcherConfig;
use crate::error::{ConfigError, DispatchError};
use crate::executor::BatchExecutor;
use crate::worker::WorkerHandle;

/// Lifecycle phase of a [`BatchDispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    /// Accepting new submissions.
    Running = 0,
    /// Shutdown has begun: no new submissions, in-flight requests are being
    /// flushed.
    Draining = 1,
    /// Terminal: the dispatch task has exited and every submitted request
    /// has an outcome.
    Stopped = 2,
}

/// Atomic storage for [`DispatcherState`].
struct StateCell(AtomicU8);

impl StateCell {
    fn new(state: DispatcherState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    fn load(&self) -> DispatcherState {
        match self.0.load(Ordering::SeqCst) {
            0 => DispatcherState::Running,
            1 => DispatcherState::Draining,
            _ => DispatcherState::Stopped,
        }
    }

    fn store(&self, state: DispatcherState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    /// Atomically moves `from → to`; fails if another transition won.
    fn transition(&self, from: DispatcherState, to: DispatcherState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// A bounded-latency request-batching dispatcher.
///
/// Accepts individual requests from arbitrarily many concurrent callers,
/// groups them into batches of at most
/// [`max_batch_size`](DispatcherConfig::max_batch_size), and guarantees that
/// no request waits longer than [`max_wait`](DispatcherConfig::max_wait)
/// before its batch begins executing — whichever fills first, size or time,
/// triggers dispatch. Results are delivered back to each caller positionally.
///
/// Construction spawns the dispatch task; [`shutdown`](Self::shutdown) drains
/// and joins it. Dropping the dispatcher without shutting it down closes the
/// intake and lets the task drain detached.
///
/// See the [crate docs](crate) for a usage example.
pub struct BatchDispatcher<E: BatchExecutor> {
    /// Intake sender; taken (and thereby closed) when shutdown begins.
    intake: Mutex<Option<UnboundedSender<QueueItem<E::Input, E::Output>>>>,

    /// Requests currently enqueued but not yet pulled into a batch.
    queue_depth: Arc<AtomicUsize>,

    state: StateCell,

    worker: WorkerHandle,

    config: DispatcherConfig,
}

impl<E: BatchExecutor> BatchDispatcher<E> {
    /// Creates a dispatcher and starts its dispatch task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration fails validation; no
    /// task is spawned in that case.
    pub fn new(executor: E, config: DispatcherConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (intake_tx, intake_rx) = mpsc::unbounded_channel();
        let queue_depth = Arc::new(AtomicUsize::new(0));
        let worker = WorkerHandle::new(tokio::spawn(dispatch_loop(
            executor,
            intake_rx,
            config.clone(),
            queue_depth.clone(),
        )));

        debug!(
            max_batch_size = config.max_batch_size,
            max_wait_ms = config.max_wait.as_millis() as u64,
            "dispatcher started"
        );

        Ok(Self {
            intake: Mutex::new(Some(intake_tx)),
            queue_depth,
            state: StateCell::new(DispatcherState::Running),
            worker,
            config,
        })
    }

    /// Submits one input and waits for its result.
    ///
    /// Safe to call from arbitrarily many tasks concurrently; each caller
    /// suspends on its own result slot until the request's batch has
    /// executed.
    ///
    /// # Errors
    ///
    /// * [`DispatchError::Closed`] if shutdown has begun or completed.
    /// * [`DispatchError::QueueFull`] if a configured
    ///   [`max_queue_depth`](DispatcherConfig::max_queue_depth) is exceeded.
    /// * [`DispatchError::Executor`] if the executor failed this request's
    ///   whole batch.
    pub async fn submit(&self, input: E::Input) -> Result<E::Output, DispatchError> {
        self.enqueue(input).await?.await
    }

    /// Like [`submit`](Self::submit), but gives up after `wait`.
    ///
    /// On expiry the call fails with [`DispatchError::Cancelled`] and the
    /// request is best-effort removed from any still-forming batch. If its
    /// batch has already been handed to the executor, the result is computed
    /// and discarded.
    pub async fn submit_with_timeout(
        &self,
        input: E::Input,
        wait: Duration,
    ) -> Result<E::Output, DispatchError> {
        let item = self.enqueue(input).await?;
        match tokio::time::timeout(wait, item).await {
            Ok(outcome) => outcome,
            // Dropping the Item closed the result slot; the dispatch loop
            // prunes the request when it next forms a batch.
            Err(_) => Err(DispatchError::Cancelled),
        }
    }

    /// Enqueues one input and returns its pending result.
    ///
    /// Dropping the returned [`Item`] cancels the request best-effort. Most
    /// callers want [`submit`](Self::submit) instead.
    pub async fn enqueue(&self, input: E::Input) -> Result<Item<E::Output>, DispatchError> {
        if self.state.load() != DispatcherState::Running {
            return Err(DispatchError::Closed);
        }
        if let Some(limit) = self.config.max_queue_depth
            && self.queue_depth.load(Ordering::Relaxed) >= limit
        {
            return Err(DispatchError::QueueFull);
        }

        let (tx, rx) = oneshot::channel();
        let item = QueueItem::new(input, tx);
        trace!(id = %item.id(), "enqueueing request");

        {
            let intake = self.intake.lock().await;
            let sender = intake.as_ref().ok_or(DispatchError::Closed)?;
            sender.send(item).map_err(|_| DispatchError::Closed)?;
            self.queue_depth.fetch_add(1, Ordering::Relaxed);
        }

        Ok(Item::new(rx))
    }

    /// Shuts the dispatcher down and waits for a full drain.
    ///
    /// Submissions made after this call begins fail immediately with
    /// [`DispatchError::Closed`]. The in-flight forming batch, and everything
    /// already enqueued behind it, is still dispatched: those requests paid
    /// their wait cost and get a result rather than being dropped. Returns
    /// once the dispatch task has exited and every previously submitted
    /// request has an outcome.
    ///
    /// Idempotent; calls after the first return immediately.
    pub async fn shutdown(&self) {
        if !self
            .state
            .transition(DispatcherState::Running, DispatcherState::Draining)
        {
            return;
        }
        debug!("dispatcher draining");

        // Dropping the only intake sender closes the channel; the dispatch
        // loop finalizes its forming batch, drains the buffer, and exits.
        self.intake.lock().await.take();
        self.worker.join().await;

        self.state.store(DispatcherState::Stopped);
        debug!("dispatcher stopped");
    }

    /// Current lifecycle phase.
    pub fn state(&self) -> DispatcherState {
        self.state.load()
    }

    /// Number of requests enqueued but not yet pulled into a batch.
    pub fn queue_depth(&self) -> usize {
        self.queue_depth.load(Ordering::Relaxed)
    }
}

impl<E: BatchExecutor> Drop for BatchDispatcher<E> {
    /// Closes the intake so the dispatch task drains and exits on its own.
    /// Callers wanting to wait for the drain use [`shutdown`](Self::shutdown).
    fn drop(&mut self) {
        if let Ok(mut intake) = self.intake.try_lock() {
            intake.take();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::error::BoxError;

    struct EchoExecutor;

    #[async_trait]
    impl BatchExecutor for EchoExecutor {
        type Input = u32;
        type Output = u32;

        async fn process(&self, batch: Vec<u32>) -> Result<Vec<u32>, BoxError> {
            Ok(batch)
        }
    }

    #[tokio::test]
    async fn rejects_invalid_configuration() {
        let config = DispatcherConfig {
            max_batch_size: 0,
            ..DispatcherConfig::default()
        };
        assert!(matches!(
            BatchDispatcher::new(EchoExecutor, config),
            Err(ConfigError::ZeroBatchSize)
        ));
    }

    #[tokio::test]
    async fn starts_running_and_stops_after_shutdown() {
        let dispatcher = BatchDispatcher::new(EchoExecutor, DispatcherConfig::default()).unwrap();
        assert_eq!(dispatcher.state(), DispatcherState::Running);

        dispatcher.shutdown().await;
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let dispatcher = BatchDispatcher::new(EchoExecutor, DispatcherConfig::default()).unwrap();

        dispatcher.shutdown().await;
        dispatcher.shutdown().await;
        assert_eq!(dispatcher.state(), DispatcherState::Stopped);
    }

    #[tokio::test]
    async fn submit_after_shutdown_fails_closed() {
        let dispatcher = BatchDispatcher::new(EchoExecutor, DispatcherConfig::default()).unwrap();
        dispatcher.shutdown().await;

        assert!(matches!(
            dispatcher.submit(1).await,
            Err(DispatchError::Closed)
        ));
    }
}
