use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::DispatchError;

/// A pending result for one submitted request.
///
/// Returned by [`BatchDispatcher::enqueue`](crate::BatchDispatcher::enqueue);
/// awaiting it yields the request's result once its batch has executed.
///
/// Dropping an `Item` before it resolves cancels the request best-effort:
/// the dispatch loop prunes abandoned requests from any still-forming batch,
/// but a request already inside a dispatched batch is still computed and its
/// result discarded.
pub struct Item<T> {
    /// The underlying single-assignment slot.
    receiver: oneshot::Receiver<Result<T, DispatchError>>,
}

impl<T> Item<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<Result<T, DispatchError>>) -> Self {
        Self { receiver }
    }
}

impl<T> Future for Item<T> {
    type Output = Result<T, DispatchError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.get_mut().receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Sender dropped without a result: the dispatcher went away
            // before this request was answered.
            Poll::Ready(Err(_)) => Poll::Ready(Err(DispatchError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_to_sent_result() {
        let (tx, rx) = oneshot::channel();
        let item = Item::new(rx);

        tx.send(Ok(42u32)).unwrap();
        assert_eq!(item.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn dropped_sender_maps_to_closed() {
        let (tx, rx) = oneshot::channel::<Result<u32, DispatchError>>();
        let item = Item::new(rx);

        drop(tx);
        assert!(matches!(item.await, Err(DispatchError::Closed)));
    }

    #[tokio::test]
    async fn propagates_batch_failure() {
        let (tx, rx) = oneshot::channel::<Result<u32, DispatchError>>();
        let item = Item::new(rx);

        tx.send(Err(DispatchError::executor("bad batch".into())))
            .unwrap();
        assert!(matches!(item.await, Err(DispatchError::Executor(_))));
    }
}
