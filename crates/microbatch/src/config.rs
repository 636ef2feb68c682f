use std::time::Duration;

use crate::error::ConfigError;

/// Tuning parameters for a [`BatchDispatcher`](crate::BatchDispatcher).
///
/// Validated once at construction; a dispatcher never runs with an invalid
/// configuration.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use microbatch::DispatcherConfig;
///
/// let config = DispatcherConfig {
///     max_batch_size: 4,
///     max_wait: Duration::from_millis(20),
///     ..DispatcherConfig::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Upper bound on requests per batch. Must be greater than zero.
    ///
    /// A batch dispatches as soon as it reaches this size, regardless of how
    /// much of the wait window remains.
    pub max_batch_size: usize,

    /// Maximum time a request may sit queued before its batch is forced to
    /// dispatch, counted from the arrival of the *first* request in the
    /// forming batch. Zero dispatches each first arrival immediately.
    pub max_wait: Duration,

    /// Optional cap on requests pending in the intake queue.
    ///
    /// `None` leaves the intake unbounded: memory grows with overload and
    /// backpressure is the caller's concern. `Some(n)` rejects submissions
    /// with [`DispatchError::QueueFull`](crate::DispatchError::QueueFull)
    /// while `n` requests are already waiting to join a batch.
    pub max_queue_depth: Option<usize>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 128,
            max_wait: Duration::from_millis(50),
            max_queue_depth: None,
        }
    }
}

impl DispatcherConfig {
    /// Checks the configuration bounds.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `max_batch_size` is zero, or if
    /// `max_queue_depth` is set to zero. A negative wait is unrepresentable
    /// since [`Duration`] is unsigned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.max_queue_depth == Some(0) {
            return Err(ConfigError::ZeroQueueDepth);
        }
        Ok(())
    }
}
