//! Execution-scoped transaction registry.

use crate::error::{CoreError, CoreResult};
use crate::transaction::SharedTransaction;
use std::collections::HashMap;

/// Holds the transaction handles registered for one logical execution.
///
/// Each concurrent execution owns its own registry instance, reached through
/// its [`ExecutionContext`](crate::ExecutionContext), so two executions can
/// use the same name without observing each other's handles. A name holds at
/// most one handle at a time.
#[derive(Debug, Default)]
pub struct TransactionRegistry {
    entries: HashMap<String, SharedTransaction>,
}

impl TransactionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transaction handle under `name`.
    ///
    /// Registering a name that already holds a handle is a programming
    /// error; the existing entry is left untouched.
    pub fn register(&mut self, name: &str, transaction: SharedTransaction) -> CoreResult<()> {
        if self.entries.contains_key(name) {
            return Err(CoreError::DuplicateRegistration {
                name: name.to_owned(),
            });
        }
        self.entries.insert(name.to_owned(), transaction);
        Ok(())
    }

    /// Returns the handle registered under `name`.
    pub fn get(&self, name: &str) -> CoreResult<SharedTransaction> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::NotRegistered {
                name: name.to_owned(),
            })
    }

    /// Returns true if `name` currently holds a handle.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Removes and returns the handle registered under `name`.
    ///
    /// Removing an absent name is a no-op; teardown paths may run before
    /// registration ever happened.
    pub fn remove(&mut self, name: &str) -> Option<SharedTransaction> {
        self.entries.remove(name)
    }

    /// Number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no handles are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
