use async_trait::async_trait;

use crate::error::BoxError;

/// The opaque batch-scoring capability a
/// [`BatchDispatcher`](crate::BatchDispatcher) delegates work to.
///
/// The dispatcher treats the executor as a black box: given an ordered batch
/// of inputs, it must return one output per input, in the same order. Typical
/// implementations wrap a model forward pass where per-call overhead is
/// amortised across the batch.
///
/// # Contract
///
/// * The output must have the same length as the input, with positional
///   correspondence (`output[i]` answers `input[i]`). The dispatcher treats
///   any length mismatch as a whole-batch failure.
/// * A returned error fails the entire batch; the dispatcher cannot tell
///   which element caused a batched numeric computation to fail, so it never
///   retries or isolates individual inputs.
/// * Calls are strictly sequential: the dispatcher never invokes `process`
///   for batch *k+1* before the call for batch *k* has returned, so
///   implementations do not need to be reentrant.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use microbatch::{BatchExecutor, BoxError};
///
/// struct SumModel;
///
/// #[async_trait]
/// impl BatchExecutor for SumModel {
///     type Input = Vec<f32>;
///     type Output = f32;
///
///     async fn process(&self, batch: Vec<Vec<f32>>) -> Result<Vec<f32>, BoxError> {
///         Ok(batch.into_iter().map(|v| v.into_iter().sum()).collect())
///     }
/// }
/// ```
#[async_trait]
pub trait BatchExecutor: Send + Sync + 'static {
    /// One caller's input, typically a fixed-length feature vector.
    type Input: Send + 'static;

    /// One caller's result.
    type Output: Send + 'static;

    /// Scores a whole batch in one invocation.
    async fn process(&self, batch: Vec<Self::Input>) -> Result<Vec<Self::Output>, BoxError>;
}
