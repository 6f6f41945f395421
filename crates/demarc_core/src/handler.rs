//! Transactional middleware over a request pipeline.

use crate::config::HandlerConfig;
use crate::context::ExecutionContext;
use crate::error::{CoreError, CoreResult};
use crate::executor::{Completion, ErrorAction, TransactionExecutor, TransactionWork};
use crate::listener::TransactionEventListener;
use crate::policy::{CommitPolicy, FailureCatalog};
use crate::transaction::{SharedTransaction, TransactionFactory};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Middleware that runs downstream work under a managed transaction.
///
/// Two operating modes share the same protocol:
///
/// - [`TransactionHandler::handle`] wraps one downstream unit of work:
///   obtain a handle, register it, run the work under a
///   [`TransactionExecutor`], decide disposition on failure through the
///   [`CommitPolicy`], and after a rollback run the abnormal-end listeners
///   under an independently committed recovery transaction.
/// - [`TransactionHandler::handle_inbound`] /
///   [`TransactionHandler::handle_outbound`] split demarcation into the
///   pipeline's before and after phases, disposing by the context's
///   outcome flag instead of an observed failure.
///
/// The registry entry for the managed name is removed on every exit path.
pub struct TransactionHandler {
    factory: Arc<dyn TransactionFactory>,
    transaction_name: String,
    policy: CommitPolicy,
}

impl TransactionHandler {
    /// Builds a handler, validating the commit allow-list against
    /// `catalog`.
    ///
    /// Configuration errors surface here, never at transaction time.
    pub fn new(
        factory: Arc<dyn TransactionFactory>,
        config: HandlerConfig,
        catalog: &FailureCatalog,
    ) -> CoreResult<Self> {
        let policy = CommitPolicy::resolve(catalog, config.commit_on_kinds)?;
        Ok(Self {
            factory,
            transaction_name: config.transaction_name,
            policy,
        })
    }

    /// The name this handler registers its transaction under.
    #[must_use]
    pub fn transaction_name(&self) -> &str {
        &self.transaction_name
    }

    /// The resolved commit policy.
    #[must_use]
    pub fn policy(&self) -> &CommitPolicy {
        &self.policy
    }

    /// Runs `work` under a managed transaction (synchronous wrapping mode).
    ///
    /// The handle obtained from the factory is registered in the context's
    /// registry for the duration of the call, so downstream work can reach
    /// the active transaction by name. On success the listeners'
    /// `on_normal_end` fire inside the transaction, then it commits. On
    /// failure the commit policy decides: allow-listed failures commit and
    /// are absorbed into [`Completion::Absorbed`]; everything else rolls
    /// back, the listeners' `on_abnormal_end` run under an independently
    /// committed recovery transaction, and the failure propagates.
    pub fn handle<I, T, W>(
        &self,
        input: &I,
        ctx: &mut ExecutionContext<I>,
        work: W,
    ) -> CoreResult<Completion<T>>
    where
        W: FnOnce(&I, &mut ExecutionContext<I>) -> CoreResult<T>,
    {
        let transaction = self.factory.get_transaction(&self.transaction_name)?;
        ctx.registry_mut()
            .register(&self.transaction_name, transaction.clone())?;

        let listeners = ctx.listeners().to_vec();
        let mut executor = TransactionExecutor::new(transaction);
        let result = {
            let mut primary = PrimaryWork {
                policy: &self.policy,
                listeners: &listeners,
                input,
                ctx: &mut *ctx,
                work: Some(work),
                _output: PhantomData,
            };
            executor.execute(&mut primary)
        };
        ctx.registry_mut().remove(&self.transaction_name);
        result
    }

    /// Begin phase of the split mode: obtains a handle, registers it, and
    /// starts the transaction.
    ///
    /// A `begin` failure propagates with the registry entry left in place;
    /// the end phase, which the pipeline runs unconditionally, disposes of
    /// it.
    pub fn handle_inbound<I>(&self, ctx: &mut ExecutionContext<I>) -> CoreResult<()> {
        let transaction = self.factory.get_transaction(&self.transaction_name)?;
        ctx.registry_mut()
            .register(&self.transaction_name, transaction.clone())?;
        transaction.begin()
    }

    /// End phase of the split mode.
    ///
    /// With no registered entry (the begin phase never ran, or failed
    /// before registering) this is a no-op success. Otherwise the entry is
    /// removed and the transaction committed or rolled back according to
    /// the context's outcome flag. The commit policy and the recovery
    /// transaction play no part in this mode.
    pub fn handle_outbound<I>(&self, ctx: &mut ExecutionContext<I>) -> CoreResult<()> {
        let Some(transaction) = ctx.registry_mut().remove(&self.transaction_name) else {
            return Ok(());
        };
        if ctx.process_succeeded() {
            transaction.commit()
        } else {
            transaction.rollback()
        }
    }
}

impl fmt::Debug for TransactionHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransactionHandler")
            .field("transaction_name", &self.transaction_name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Primary unit of work: the downstream call plus normal-end notification,
/// with the commit-override / recovery-transaction error hook.
struct PrimaryWork<'a, I, T, W> {
    policy: &'a CommitPolicy,
    listeners: &'a [Arc<dyn TransactionEventListener<I>>],
    input: &'a I,
    ctx: &'a mut ExecutionContext<I>,
    work: Option<W>,
    _output: PhantomData<fn() -> T>,
}

impl<I, T, W> TransactionWork for PrimaryWork<'_, I, T, W>
where
    W: FnOnce(&I, &mut ExecutionContext<I>) -> CoreResult<T>,
{
    type Output = T;

    fn run(&mut self, _transaction: &SharedTransaction) -> CoreResult<T> {
        let work = self
            .work
            .take()
            .ok_or_else(|| CoreError::invalid_state("unit of work already consumed"))?;
        let value = work(self.input, &mut *self.ctx)?;
        for listener in self.listeners {
            listener.on_normal_end(self.input, self.ctx)?;
        }
        Ok(value)
    }

    fn on_error(
        &mut self,
        executor: &mut TransactionExecutor,
        failure: &CoreError,
    ) -> CoreResult<ErrorAction> {
        if self.policy.should_commit(failure) {
            executor.commit()?;
            for listener in self.listeners {
                listener.on_normal_end(self.input, self.ctx)?;
            }
            return Ok(ErrorAction::Absorb);
        }
        executor.rollback()?;

        // The abnormal-end callbacks run under their own transaction, begun
        // only after the primary rollback completed, so their writes
        // survive the rollback.
        let mut recovery = TransactionExecutor::new(executor.transaction().clone());
        let mut cleanup = RecoveryWork {
            listeners: self.listeners,
            failure,
            input: self.input,
            ctx: &mut *self.ctx,
        };
        recovery.execute(&mut cleanup)?;
        Ok(ErrorAction::Propagate)
    }
}

/// Recovery unit of work: the abnormal-end callbacks, committed by the
/// recovery executor. Uses the default rollback hook.
struct RecoveryWork<'a, I> {
    listeners: &'a [Arc<dyn TransactionEventListener<I>>],
    failure: &'a CoreError,
    input: &'a I,
    ctx: &'a mut ExecutionContext<I>,
}

impl<I> TransactionWork for RecoveryWork<'_, I> {
    type Output = ();

    fn run(&mut self, _transaction: &SharedTransaction) -> CoreResult<()> {
        for listener in self.listeners {
            listener.on_abnormal_end(self.failure, self.input, self.ctx)?;
        }
        Ok(())
    }
}
