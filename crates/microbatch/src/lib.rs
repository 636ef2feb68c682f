//! # Microbatch
//!
//! A bounded-latency request-batching dispatcher for model inference.
//!
//! ## Overview
//!
//! Scoring one feature vector at a time wastes most of a model's per-call
//! overhead; batching amortises it, but naive batching makes early arrivals
//! wait indefinitely for the batch to fill. This crate sits between the two:
//! concurrent callers submit individual requests, a single dispatch loop
//! groups them into batches of at most `max_batch_size`, and no request waits
//! longer than `max_wait` before its batch is handed to the executor —
//! whichever bound fills first, size or time, triggers dispatch.
//!
//! Key components:
//!
//! - [`BatchDispatcher`] — intake channel, dispatch loop, and shutdown
//!   protocol
//! - [`BatchExecutor`] — the injected, opaque batch-scoring capability
//! - [`Item`] — a per-request pending result; dropping it cancels the
//!   request best-effort
//! - [`DispatcherConfig`] — batch size, wait bound, and optional intake
//!   depth limit
//!
//! ## Guarantees
//!
//! - Batches are dispatched non-empty, in FIFO arrival order, with results
//!   mapped back positionally.
//! - Executor invocations never overlap; a request's end-to-end wait is
//!   bounded by `max_wait` plus at most one prior executor invocation.
//! - [`BatchDispatcher::shutdown`] flushes everything already enqueued
//!   before returning; no caller is left permanently blocked.
//! - Executor failures fail the whole batch identically for every member.
//!   The dispatcher never retries: it cannot know which input broke a
//!   batched numeric computation, so resilience belongs at the `submit`
//!   call site or inside the executor.
//!
//! ## Example
//!
//! ```
//! use async_trait::async_trait;
//! use microbatch::{BatchDispatcher, BatchExecutor, BoxError, DispatcherConfig};
//!
//! struct SumModel;
//!
//! #[async_trait]
//! impl BatchExecutor for SumModel {
//!     type Input = Vec<f32>;
//!     type Output = f32;
//!
//!     async fn process(&self, batch: Vec<Vec<f32>>) -> Result<Vec<f32>, BoxError> {
//!         Ok(batch.into_iter().map(|v| v.into_iter().sum()).collect())
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let dispatcher = BatchDispatcher::new(SumModel, DispatcherConfig::default()).unwrap();
//!
//! let score = dispatcher.submit(vec![1.0, 2.0, 3.0]).await.unwrap();
//! assert_eq!(score, 6.0);
//!
//! dispatcher.shutdown().await;
//! # }
//! ```
//!
//! ## Scope
//!
//! The dispatcher is transport-agnostic and in-process: any serving layer
//! (HTTP, gRPC) is an external collaborator translating network requests
//! into [`submit`](BatchDispatcher::submit) calls. Feature extraction, model
//! loading, and persistence live outside this crate.

mod batch;
mod communication;
mod config;
mod dispatcher;
mod error;
mod executor;
mod worker;

pub use communication::Item;
pub use config::DispatcherConfig;
pub use dispatcher::{BatchDispatcher, DispatcherState};
pub use error::{BoxError, ConfigError, DispatchError};
pub use executor::BatchExecutor;
