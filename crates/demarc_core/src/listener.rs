//! Transaction-end notification points.

use crate::context::ExecutionContext;
use crate::error::{CoreError, CoreResult};

/// Collaborator notified when a managed transaction ends.
///
/// Listeners are registered on the execution context by the pipeline; the
/// middleware invokes them in registration order. `on_normal_end` fires
/// inside a transaction that is about to commit; `on_abnormal_end` fires
/// inside the recovery transaction after the primary one rolled back, so
/// diagnostic or cleanup writes made there are durably saved.
///
/// A failure returned from either notification point is an ordinary failure
/// on whichever path invoked it.
pub trait TransactionEventListener<I>: Send + Sync {
    /// Called when the unit of work is ending normally.
    fn on_normal_end(&self, input: &I, ctx: &mut ExecutionContext<I>) -> CoreResult<()>;

    /// Called after the primary transaction rolled back, with the failure
    /// that caused the rollback.
    fn on_abnormal_end(
        &self,
        failure: &CoreError,
        input: &I,
        ctx: &mut ExecutionContext<I>,
    ) -> CoreResult<()>;
}
