//! Transaction capability and factory seams.

use crate::error::CoreResult;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Default registration name for the transaction managed by the middleware.
pub const DEFAULT_TRANSACTION_NAME: &str = "transaction";

/// Transaction control over an underlying resource.
///
/// Implemented by resource drivers. The core only drives the three
/// demarcation operations; everything else about the resource stays opaque.
/// Each operation is synchronous and may fail; the core never retries a
/// failed operation.
pub trait Transaction: Send {
    /// Starts a new transaction on the resource.
    fn begin(&mut self) -> CoreResult<()>;

    /// Commits the current transaction.
    fn commit(&mut self) -> CoreResult<()>;

    /// Rolls back the current transaction.
    fn rollback(&mut self) -> CoreResult<()>;
}

/// A transaction handle shared within one logical execution.
///
/// The registry, the executor, and downstream work all hold the same handle.
/// The lock serializes access to the underlying resource, which some drivers
/// require per logical connection; it is not a cross-execution
/// synchronization point.
#[derive(Clone)]
pub struct SharedTransaction {
    inner: Arc<Mutex<Box<dyn Transaction>>>,
}

impl SharedTransaction {
    /// Wraps a driver transaction for shared use.
    pub fn new<T: Transaction + 'static>(transaction: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(transaction))),
        }
    }

    /// Starts a new transaction on the resource.
    pub fn begin(&self) -> CoreResult<()> {
        self.inner.lock().begin()
    }

    /// Commits the current transaction.
    pub fn commit(&self) -> CoreResult<()> {
        self.inner.lock().commit()
    }

    /// Rolls back the current transaction.
    pub fn rollback(&self) -> CoreResult<()> {
        self.inner.lock().rollback()
    }
}

impl fmt::Debug for SharedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedTransaction").finish_non_exhaustive()
    }
}

/// Supplies transaction handles for a named resource.
pub trait TransactionFactory: Send + Sync {
    /// Creates a transaction handle for `resource_name`.
    ///
    /// Invoked once per middleware invocation (or begin phase). A failure
    /// here propagates before any registry entry is created.
    fn get_transaction(&self, resource_name: &str) -> CoreResult<SharedTransaction>;
}
