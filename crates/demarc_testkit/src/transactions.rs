//! Journaling mock transactions and a scriptable factory.

use demarc_core::{CoreError, CoreResult, SharedTransaction, Transaction, TransactionFactory};
use parking_lot::Mutex;
use std::sync::Arc;

/// A transaction control operation observed by a mock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxOp {
    /// `begin` was called.
    Begin,
    /// `commit` was called.
    Commit,
    /// `rollback` was called.
    Rollback,
}

/// Shared journal of transaction operations, in call order.
///
/// Clones share the same journal, so a test can hand one log to several
/// mocks and assert on the global operation order afterwards.
#[derive(Debug, Clone, Default)]
pub struct OpLog {
    ops: Arc<Mutex<Vec<TxOp>>>,
}

impl OpLog {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an operation.
    pub fn record(&self, op: TxOp) {
        self.ops.lock().push(op);
    }

    /// All recorded operations, in call order.
    #[must_use]
    pub fn ops(&self) -> Vec<TxOp> {
        self.ops.lock().clone()
    }

    /// Number of times `op` was recorded.
    #[must_use]
    pub fn count(&self, op: TxOp) -> usize {
        self.ops.lock().iter().filter(|&&o| o == op).count()
    }
}

/// Mock transaction that journals every operation and can be scripted to
/// fail a specific operation once.
///
/// Operations are journaled when called, before any scripted failure fires,
/// so tests can assert on attempted calls.
#[derive(Debug)]
pub struct MockTransaction {
    log: OpLog,
    fail_begin: Option<CoreError>,
    fail_commit: Option<CoreError>,
    fail_rollback: Option<CoreError>,
}

impl MockTransaction {
    /// Creates a well-behaved mock journaling into `log`.
    #[must_use]
    pub fn new(log: OpLog) -> Self {
        Self {
            log,
            fail_begin: None,
            fail_commit: None,
            fail_rollback: None,
        }
    }

    /// Scripts the next `begin` to fail with `error`.
    #[must_use]
    pub fn failing_begin(mut self, error: CoreError) -> Self {
        self.fail_begin = Some(error);
        self
    }

    /// Scripts the next `commit` to fail with `error`.
    #[must_use]
    pub fn failing_commit(mut self, error: CoreError) -> Self {
        self.fail_commit = Some(error);
        self
    }

    /// Scripts the next `rollback` to fail with `error`.
    #[must_use]
    pub fn failing_rollback(mut self, error: CoreError) -> Self {
        self.fail_rollback = Some(error);
        self
    }

    /// Wraps this mock into a shared handle.
    #[must_use]
    pub fn into_shared(self) -> SharedTransaction {
        SharedTransaction::new(self)
    }
}

impl Transaction for MockTransaction {
    fn begin(&mut self) -> CoreResult<()> {
        self.log.record(TxOp::Begin);
        match self.fail_begin.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn commit(&mut self) -> CoreResult<()> {
        self.log.record(TxOp::Commit);
        match self.fail_commit.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn rollback(&mut self) -> CoreResult<()> {
        self.log.record(TxOp::Rollback);
        match self.fail_rollback.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Scriptable [`TransactionFactory`].
///
/// Hands out prepared mocks in order, then fresh well-behaved mocks
/// journaling into the factory's log once the script is exhausted. The next
/// `get_transaction` call can be scripted to fail, and requested resource
/// names are recorded for assertions.
#[derive(Debug)]
pub struct MockTransactionFactory {
    log: OpLog,
    prepared: Mutex<Vec<MockTransaction>>,
    fail_next: Mutex<Option<CoreError>>,
    requested: Mutex<Vec<String>>,
}

impl MockTransactionFactory {
    /// Creates a factory journaling into `log`.
    #[must_use]
    pub fn new(log: OpLog) -> Self {
        Self {
            log,
            prepared: Mutex::new(Vec::new()),
            fail_next: Mutex::new(None),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Queues a prepared mock to hand out before any fresh ones.
    pub fn prepare(&self, transaction: MockTransaction) {
        self.prepared.lock().push(transaction);
    }

    /// Scripts the next `get_transaction` call to fail with `error`.
    pub fn fail_next(&self, error: CoreError) {
        *self.fail_next.lock() = Some(error);
    }

    /// Resource names requested so far, in call order.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl TransactionFactory for MockTransactionFactory {
    fn get_transaction(&self, resource_name: &str) -> CoreResult<SharedTransaction> {
        self.requested.lock().push(resource_name.to_owned());
        if let Some(error) = self.fail_next.lock().take() {
            return Err(error);
        }
        let transaction = {
            let mut prepared = self.prepared.lock();
            if prepared.is_empty() {
                MockTransaction::new(self.log.clone())
            } else {
                prepared.remove(0)
            }
        };
        Ok(transaction.into_shared())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_journals_operations_in_order() {
        let log = OpLog::new();
        let mut txn = MockTransaction::new(log.clone());

        txn.begin().unwrap();
        txn.commit().unwrap();

        assert_eq!(log.ops(), vec![TxOp::Begin, TxOp::Commit]);
        assert_eq!(log.count(TxOp::Begin), 1);
        assert_eq!(log.count(TxOp::Rollback), 0);
    }

    #[test]
    fn scripted_failure_fires_once() {
        let log = OpLog::new();
        let mut txn = MockTransaction::new(log.clone())
            .failing_commit(CoreError::invalid_state("scripted"));

        assert!(txn.commit().is_err());
        assert!(txn.commit().is_ok());
        // Both attempts were journaled.
        assert_eq!(log.count(TxOp::Commit), 2);
    }

    #[test]
    fn factory_hands_out_prepared_then_fresh() {
        let log = OpLog::new();
        let factory = MockTransactionFactory::new(log.clone());
        factory.prepare(
            MockTransaction::new(log.clone()).failing_begin(CoreError::invalid_state("scripted")),
        );

        let first = factory.get_transaction("transaction").unwrap();
        assert!(first.begin().is_err());

        let second = factory.get_transaction("transaction").unwrap();
        assert!(second.begin().is_ok());

        assert_eq!(factory.requested().len(), 2);
    }

    #[test]
    fn factory_failure_is_scriptable() {
        let factory = MockTransactionFactory::new(OpLog::new());
        factory.fail_next(CoreError::invalid_state("no resource"));

        assert!(factory.get_transaction("transaction").is_err());
        assert!(factory.get_transaction("transaction").is_ok());
    }
}
