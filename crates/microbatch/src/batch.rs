//! The batching algorithm: a single loop that turns a stream of individual
//! requests into bounded, deadline-limited executor invocations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, error, trace, warn};

use crate::communication::QueueItem;
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::executor::BatchExecutor;

/// Why a forming batch stopped collecting and was handed to the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchTrigger {
    /// The batch reached `max_batch_size`.
    Size,
    /// `max_wait` elapsed since the batch's first request arrived.
    Deadline,
    /// The intake closed while the batch was forming.
    Shutdown,
}

impl BatchTrigger {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Deadline => "deadline",
            Self::Shutdown => "shutdown",
        }
    }
}

/// Runs batch formation and dispatch until the intake channel is closed and
/// fully drained.
///
/// One instance of this loop exists per dispatcher, on its own task. Callers
/// only ever touch the intake sender and their private result slots, so the
/// loop owns batch formation outright.
///
/// Executor invocations are strictly sequential: collection of the next
/// batch does not begin until the previous call has returned and its results
/// have been delivered.
pub(crate) async fn dispatch_loop<E: BatchExecutor>(
    executor: E,
    mut intake: UnboundedReceiver<QueueItem<E::Input, E::Output>>,
    config: DispatcherConfig,
    queue_depth: Arc<AtomicUsize>,
) {
    loop {
        // Idle wait: no deadline runs until a batch has a first request, so
        // an idle dispatcher parks here without consuming CPU.
        let first = match intake.recv().await {
            Some(item) => item,
            // Intake closed and drained: the dispatcher is shutting down.
            None => break,
        };
        queue_depth.fetch_sub(1, Ordering::Relaxed);

        // The wait bound is measured from the arrival of the first request
        // in the forming batch, not per request and not from executor
        // availability.
        let deadline = Instant::now() + config.max_wait;
        let mut batch = vec![first];
        let mut trigger = BatchTrigger::Size;
        let mut intake_closed = false;

        while batch.len() < config.max_batch_size {
            match timeout_at(deadline, intake.recv()).await {
                Ok(Some(item)) => {
                    queue_depth.fetch_sub(1, Ordering::Relaxed);
                    batch.push(item);
                }
                Ok(None) => {
                    // Shutdown while collecting: finalize what we have
                    // rather than waiting out the deadline. These requests
                    // already paid their wait cost.
                    trigger = BatchTrigger::Shutdown;
                    intake_closed = true;
                    break;
                }
                Err(_) => {
                    trigger = BatchTrigger::Deadline;
                    break;
                }
            }
        }

        run_batch(&executor, batch, trigger).await;

        if intake_closed {
            break;
        }
    }
    debug!("dispatch loop exited");
}

/// Executes one formed batch and delivers results positionally.
async fn run_batch<E: BatchExecutor>(
    executor: &E,
    mut batch: Vec<QueueItem<E::Input, E::Output>>,
    trigger: BatchTrigger,
) {
    // Callers that gave up before dispatch are pruned here; once the
    // executor call below starts, cancellation no longer has any effect.
    batch.retain(|item| {
        if item.is_abandoned() {
            trace!(id = %item.id(), "pruning abandoned request from forming batch");
            false
        } else {
            true
        }
    });
    if batch.is_empty() {
        return;
    }

    debug!(
        size = batch.len(),
        trigger = trigger.as_str(),
        "dispatching batch"
    );

    let (inputs, senders): (Vec<_>, Vec<_>) =
        batch.into_iter().map(QueueItem::into_parts).unzip();
    let expected = inputs.len();

    match executor.process(inputs).await {
        Ok(outputs) if outputs.len() == expected => {
            for (sender, output) in senders.into_iter().zip(outputs) {
                if sender.send(Ok(output)).is_err() {
                    warn!("result receiver dropped before delivery; discarding output");
                }
            }
        }
        Ok(outputs) => {
            error!(
                expected,
                produced = outputs.len(),
                "executor broke positional correspondence; failing whole batch"
            );
            let cause = format!(
                "executor returned {} outputs for {} inputs",
                outputs.len(),
                expected
            );
            fail_batch(senders, DispatchError::executor(cause.into()));
        }
        Err(cause) => {
            error!(size = expected, error = %cause, "executor failed; failing whole batch");
            fail_batch(senders, DispatchError::executor(cause));
        }
    }
}

/// Delivers the same failure to every member of a batch. No partial results,
/// no retry: the dispatcher cannot know which input caused a batched
/// computation to fail.
fn fail_batch<O>(
    senders: Vec<tokio::sync::oneshot::Sender<Result<O, DispatchError>>>,
    error: DispatchError,
) {
    for sender in senders {
        // A send failure here means the caller also gave up; nothing to do.
        let _ = sender.send(Err(error.clone()));
    }
}
