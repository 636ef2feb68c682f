use std::sync::Arc;

use thiserror::Error;

/// Error currency for [`BatchExecutor`](crate::BatchExecutor) implementations.
///
/// Executors report whole-batch failures with whatever concrete error type
/// they like, boxed behind this alias.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Construction-time configuration failures.
///
/// Returned by [`DispatcherConfig::validate`](crate::DispatcherConfig::validate)
/// and by [`BatchDispatcher::new`](crate::BatchDispatcher::new). A dispatcher
/// is never created with an invalid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `max_batch_size` was zero. A batch must be able to hold at least one
    /// request.
    #[error("max_batch_size must be greater than zero")]
    ZeroBatchSize,

    /// `max_queue_depth` was set to zero. A bounded intake that can hold no
    /// requests would reject every submission.
    #[error("max_queue_depth, when set, must be greater than zero")]
    ZeroQueueDepth,
}

/// Failures observable by a caller of
/// [`BatchDispatcher::submit`](crate::BatchDispatcher::submit).
///
/// Cloneable so an executor failure can fan out to every member of the
/// failed batch.
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    /// The dispatcher was shut down before this request could be delivered a
    /// result, or the submission arrived after shutdown had begun.
    #[error("dispatcher is closed")]
    Closed,

    /// The caller abandoned the request (timeout or dropped
    /// [`Item`](crate::Item)) before its batch was dispatched.
    #[error("request cancelled before dispatch")]
    Cancelled,

    /// The intake queue was at its configured depth limit. Only produced
    /// when [`DispatcherConfig::max_queue_depth`](crate::DispatcherConfig)
    /// is set.
    #[error("intake queue is full")]
    QueueFull,

    /// The executor failed for the whole batch this request was part of.
    /// Every member of the batch receives the same shared cause; the
    /// dispatcher never retries or delivers partial results.
    #[error("batch execution failed: {0}")]
    Executor(Arc<BoxError>),
}

impl DispatchError {
    /// Wraps an executor failure so it can be delivered to every member of
    /// the failed batch.
    pub(crate) fn executor(cause: BoxError) -> Self {
        Self::Executor(Arc::new(cause))
    }
}
