//! Run-under-transaction primitive with two-level failure handling.

use crate::error::{CoreError, CoreResult};
use crate::transaction::SharedTransaction;
use tracing::warn;

/// Lifecycle of a [`TransactionExecutor`].
///
/// `Committed` and `RolledBack` are terminal; a handle is never driven
/// through the same executor again once terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    /// No transaction has been started yet.
    Idle,
    /// The transaction is active.
    Begun,
    /// The transaction was committed.
    Committed,
    /// The transaction was rolled back.
    RolledBack,
}

/// What the error hook decided to do with the original failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// The failure was absorbed; the executor reports it as
    /// [`Completion::Absorbed`] instead of an error.
    Absorb,
    /// The failure propagates to the caller.
    Propagate,
}

/// Result of executing work whose error hook may absorb a failure.
#[derive(Debug)]
pub enum Completion<T> {
    /// The work succeeded and the transaction committed.
    Success(T),
    /// The work failed, but the error hook committed anyway and absorbed
    /// the failure.
    Absorbed(CoreError),
}

impl<T> Completion<T> {
    /// Returns true for [`Completion::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the success value, if any.
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Absorbed(_) => None,
        }
    }

    /// Returns the absorbed failure, if any.
    pub fn absorbed(self) -> Option<CoreError> {
        match self {
            Self::Success(_) => None,
            Self::Absorbed(failure) => Some(failure),
        }
    }
}

/// A unit of work executed under transactional control.
///
/// [`TransactionWork::on_error`] is the overridable failure hook; the
/// default rolls the transaction back and propagates the failure.
pub trait TransactionWork {
    /// Value produced by a successful run.
    type Output;

    /// Runs the work inside the active transaction.
    fn run(&mut self, transaction: &SharedTransaction) -> CoreResult<Self::Output>;

    /// Invoked when `run` or the subsequent `commit` fails.
    ///
    /// A failure raised here supersedes `failure` in propagation; the
    /// superseded failure is recorded at warning level by the executor,
    /// never re-raised alongside the new one.
    fn on_error(
        &mut self,
        executor: &mut TransactionExecutor,
        failure: &CoreError,
    ) -> CoreResult<ErrorAction> {
        let _ = failure;
        executor.rollback()?;
        Ok(ErrorAction::Propagate)
    }
}

/// Drives one transaction through begin, work, and commit or rollback.
///
/// The sequence is `begin()`, [`TransactionWork::run`], `commit()`; a
/// failure of the work or the commit is routed through
/// [`TransactionWork::on_error`]. A `begin` failure propagates directly:
/// there is nothing to dispose yet. Both `commit()` and `rollback()` may
/// themselves fail; such a failure supersedes the one that triggered the
/// hook and the superseded failure is logged rather than lost.
#[derive(Debug)]
pub struct TransactionExecutor {
    transaction: SharedTransaction,
    state: ExecutorState,
}

impl TransactionExecutor {
    /// Creates an executor over `transaction`, in the idle state.
    #[must_use]
    pub fn new(transaction: SharedTransaction) -> Self {
        Self {
            transaction,
            state: ExecutorState::Idle,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// The shared handle this executor drives.
    #[must_use]
    pub fn transaction(&self) -> &SharedTransaction {
        &self.transaction
    }

    /// Starts the transaction.
    pub fn begin(&mut self) -> CoreResult<()> {
        self.ensure(ExecutorState::Idle, "begin")?;
        self.transaction.begin()?;
        self.state = ExecutorState::Begun;
        Ok(())
    }

    /// Commits the active transaction.
    pub fn commit(&mut self) -> CoreResult<()> {
        self.ensure(ExecutorState::Begun, "commit")?;
        self.transaction.commit()?;
        self.state = ExecutorState::Committed;
        Ok(())
    }

    /// Rolls back the active transaction.
    pub fn rollback(&mut self) -> CoreResult<()> {
        self.ensure(ExecutorState::Begun, "rollback")?;
        self.transaction.rollback()?;
        self.state = ExecutorState::RolledBack;
        Ok(())
    }

    /// Runs `work` under this executor's transaction.
    ///
    /// On failure of the work or the commit, the work's
    /// [`TransactionWork::on_error`] hook decides the outcome:
    /// [`ErrorAction::Absorb`] yields [`Completion::Absorbed`],
    /// [`ErrorAction::Propagate`] yields the original failure as `Err`, and
    /// a failure inside the hook itself propagates in place of the original,
    /// which is demoted to a warning-level log record.
    pub fn execute<W: TransactionWork>(
        &mut self,
        work: &mut W,
    ) -> CoreResult<Completion<W::Output>> {
        self.begin()?;
        let failure = match self.run_and_commit(work) {
            Ok(value) => return Ok(Completion::Success(value)),
            Err(failure) => failure,
        };
        match work.on_error(self, &failure) {
            Ok(ErrorAction::Absorb) => Ok(Completion::Absorbed(failure)),
            Ok(ErrorAction::Propagate) => Err(failure),
            Err(secondary) => {
                warn!(failure = %failure, "transaction has failed");
                Err(secondary)
            }
        }
    }

    fn run_and_commit<W: TransactionWork>(&mut self, work: &mut W) -> CoreResult<W::Output> {
        let transaction = self.transaction.clone();
        let value = work.run(&transaction)?;
        self.commit()?;
        Ok(value)
    }

    fn ensure(&self, expected: ExecutorState, operation: &str) -> CoreResult<()> {
        if self.state == expected {
            return Ok(());
        }
        Err(CoreError::invalid_state(format!(
            "cannot {operation} in state {:?}",
            self.state
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demarc_testkit::prelude::*;

    struct NoopWork;

    impl TransactionWork for NoopWork {
        type Output = u32;

        fn run(&mut self, _transaction: &SharedTransaction) -> CoreResult<u32> {
            Ok(42)
        }
    }

    struct FailingWork;

    impl TransactionWork for FailingWork {
        type Output = u32;

        fn run(&mut self, _transaction: &SharedTransaction) -> CoreResult<u32> {
            Err(TestFailure::new("app.error").into_error())
        }
    }

    #[test]
    fn success_begins_and_commits() {
        let log = OpLog::new();
        let mut executor = TransactionExecutor::new(MockTransaction::new(log.clone()).into_shared());

        let completion = executor.execute(&mut NoopWork).unwrap();

        assert_eq!(completion.success(), Some(42));
        assert_eq!(log.ops(), vec![TxOp::Begin, TxOp::Commit]);
        assert_eq!(executor.state(), ExecutorState::Committed);
    }

    #[test]
    fn work_failure_rolls_back_and_propagates() {
        let log = OpLog::new();
        let mut executor = TransactionExecutor::new(MockTransaction::new(log.clone()).into_shared());

        let result = executor.execute(&mut FailingWork);

        assert!(matches!(result, Err(failure) if failure.kind() == "app.error"));
        assert_eq!(log.ops(), vec![TxOp::Begin, TxOp::Rollback]);
        assert_eq!(executor.state(), ExecutorState::RolledBack);
    }

    #[test]
    fn begin_failure_propagates_directly() {
        let log = OpLog::new();
        let transaction = MockTransaction::new(log.clone())
            .failing_begin(TestFailure::new("io.connect").into_error())
            .into_shared();
        let mut executor = TransactionExecutor::new(transaction);

        let result = executor.execute(&mut NoopWork);

        assert!(matches!(result, Err(failure) if failure.kind() == "io.connect"));
        assert_eq!(log.ops(), vec![TxOp::Begin]);
        assert_eq!(executor.state(), ExecutorState::Idle);
    }

    #[test]
    fn commit_failure_triggers_rollback_and_propagates() {
        let log = OpLog::new();
        let transaction = MockTransaction::new(log.clone())
            .failing_commit(TestFailure::new("io.commit").into_error())
            .into_shared();
        let mut executor = TransactionExecutor::new(transaction);

        let result = executor.execute(&mut NoopWork);

        // Commit failed, so the default hook rolled back; the commit
        // failure still propagates.
        assert!(matches!(result, Err(failure) if failure.kind() == "io.commit"));
        assert_eq!(log.ops(), vec![TxOp::Begin, TxOp::Commit, TxOp::Rollback]);
        assert_eq!(executor.state(), ExecutorState::RolledBack);
    }

    #[test]
    fn rollback_failure_supersedes_original() {
        let log = OpLog::new();
        let transaction = MockTransaction::new(log.clone())
            .failing_rollback(TestFailure::new("io.rollback").into_error())
            .into_shared();
        let mut executor = TransactionExecutor::new(transaction);

        let result = executor.execute(&mut FailingWork);

        // The rollback failure replaces the work failure in propagation.
        assert!(matches!(result, Err(failure) if failure.kind() == "io.rollback"));
        assert_eq!(log.ops(), vec![TxOp::Begin, TxOp::Rollback]);
    }

    // === State machine ===

    #[test]
    fn commit_before_begin_is_invalid() {
        let mut executor =
            TransactionExecutor::new(MockTransaction::new(OpLog::new()).into_shared());
        assert!(matches!(
            executor.commit(),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn double_commit_is_invalid() {
        let mut executor =
            TransactionExecutor::new(MockTransaction::new(OpLog::new()).into_shared());
        executor.begin().unwrap();
        executor.commit().unwrap();
        assert!(matches!(
            executor.commit(),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn terminal_executor_rejects_reuse() {
        let log = OpLog::new();
        let mut executor = TransactionExecutor::new(MockTransaction::new(log.clone()).into_shared());
        executor.execute(&mut NoopWork).unwrap();

        let result = executor.execute(&mut NoopWork);
        assert!(matches!(result, Err(CoreError::InvalidState { .. })));
        // Only the first cycle reached the resource.
        assert_eq!(log.ops(), vec![TxOp::Begin, TxOp::Commit]);
    }

    #[test]
    fn fresh_executor_reuses_same_handle() {
        let log = OpLog::new();
        let shared = MockTransaction::new(log.clone()).into_shared();

        TransactionExecutor::new(shared.clone())
            .execute(&mut NoopWork)
            .unwrap();
        TransactionExecutor::new(shared)
            .execute(&mut NoopWork)
            .unwrap();

        assert_eq!(
            log.ops(),
            vec![TxOp::Begin, TxOp::Commit, TxOp::Begin, TxOp::Commit]
        );
    }
}
