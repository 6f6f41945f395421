//! Per-execution context state.

use crate::listener::TransactionEventListener;
use crate::registry::TransactionRegistry;
use std::fmt;
use std::sync::Arc;

/// State owned by one logical execution (one inbound request or task).
///
/// Carries the transaction registry, the ordered transaction-end listener
/// list, and the end-to-end outcome flag consulted by the split-mode end
/// phase. A context is never shared between concurrent executions; that is
/// what keeps registry storage race-free under any concurrency substrate.
pub struct ExecutionContext<I> {
    registry: TransactionRegistry,
    listeners: Vec<Arc<dyn TransactionEventListener<I>>>,
    process_succeeded: bool,
}

impl<I> ExecutionContext<I> {
    /// Creates a fresh context with an empty registry, no listeners, and
    /// the outcome flag set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: TransactionRegistry::new(),
            listeners: Vec::new(),
            process_succeeded: true,
        }
    }

    /// The execution's transaction registry.
    #[must_use]
    pub fn registry(&self) -> &TransactionRegistry {
        &self.registry
    }

    /// Mutable access to the execution's transaction registry.
    pub fn registry_mut(&mut self) -> &mut TransactionRegistry {
        &mut self.registry
    }

    /// Appends a transaction-end listener. Listeners fire in registration
    /// order.
    pub fn add_listener(&mut self, listener: Arc<dyn TransactionEventListener<I>>) {
        self.listeners.push(listener);
    }

    /// The registered listeners, in registration order.
    #[must_use]
    pub fn listeners(&self) -> &[Arc<dyn TransactionEventListener<I>>] {
        &self.listeners
    }

    /// Whether the overall unit of work has succeeded end to end.
    #[must_use]
    pub fn process_succeeded(&self) -> bool {
        self.process_succeeded
    }

    /// Records the end-to-end outcome consulted by the split-mode end
    /// phase.
    pub fn set_process_succeeded(&mut self, succeeded: bool) {
        self.process_succeeded = succeeded;
    }
}

impl<I> Default for ExecutionContext<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> fmt::Debug for ExecutionContext<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("registry", &self.registry)
            .field("listeners", &self.listeners.len())
            .field("process_succeeded", &self.process_succeeded)
            .finish()
    }
}
