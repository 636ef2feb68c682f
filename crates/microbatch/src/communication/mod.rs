//! Per-request handshake primitives between callers and the dispatch loop.
//!
//! Each submission is paired with a single-assignment result slot: the
//! dispatch loop holds the [`QueueItem`] (input plus oneshot sender) while
//! the caller awaits the [`Item`] wrapping the matching receiver.

mod item;
mod queue_item;

pub use item::Item;
pub(crate) use queue_item::QueueItem;
