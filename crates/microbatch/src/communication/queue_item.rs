use tokio::sync::oneshot::Sender;
use uuid::Uuid;

use crate::error::DispatchError;

/// A queued request: one caller's input paired with the channel its result
/// will be delivered on.
///
/// Created by `submit`, owned by the dispatch loop from enqueue until the
/// result (or batch failure) is sent. The loop writes the slot exactly once;
/// nothing is retained afterwards.
///
/// ## Type Parameters
///
/// * `I` - The input value to be scored
/// * `O` - The result type sent back to the caller
pub(crate) struct QueueItem<I, O> {
    /// Identifier used to correlate log lines for this request.
    id: Uuid,

    /// The input value to be scored.
    input: I,

    /// Single-assignment slot for the caller's result.
    sender: Sender<Result<O, DispatchError>>,
}

impl<I, O> QueueItem<I, O> {
    pub(crate) fn new(input: I, sender: Sender<Result<O, DispatchError>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            input,
            sender,
        }
    }

    /// Identifier for this request, for logging.
    pub(crate) fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the caller has stopped waiting for the result.
    ///
    /// True once the receiving [`Item`](super::Item) has been dropped, which
    /// is how caller-side cancellation reaches the dispatch loop.
    pub(crate) fn is_abandoned(&self) -> bool {
        self.sender.is_closed()
    }

    /// Splits the item into the input to score and the slot to answer on.
    pub(crate) fn into_parts(self) -> (I, Sender<Result<O, DispatchError>>) {
        (self.input, self.sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn abandoned_after_receiver_dropped() {
        let (tx, rx) = oneshot::channel::<Result<u32, DispatchError>>();
        let item = QueueItem::new(7u32, tx);

        assert!(!item.is_abandoned());
        drop(rx);
        assert!(item.is_abandoned());
    }

    #[tokio::test]
    async fn into_parts_delivers_result() {
        let (tx, rx) = oneshot::channel();
        let item = QueueItem::new(3u32, tx);

        let (input, sender) = item.into_parts();
        assert_eq!(input, 3);

        sender.send(Ok(input * 2)).unwrap();
        assert_eq!(rx.await.unwrap().unwrap(), 6);
    }
}
