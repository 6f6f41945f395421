//! Error types for the demarc core.

use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Severity category of a failure.
///
/// [`Severity::Fatal`] covers unrecoverable, out-of-memory-class conditions.
/// Fatal failures always roll back and are never eligible for the commit
/// allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Ordinary runtime failure; eligible for commit-override.
    Recoverable,
    /// Unrecoverable failure; always rolls back.
    Fatal,
}

/// Kind identifier reported by [`CoreError::DuplicateRegistration`].
pub const DUPLICATE_REGISTRATION_KIND: &str = "core.duplicate-registration";
/// Kind identifier reported by [`CoreError::NotRegistered`].
pub const NOT_REGISTERED_KIND: &str = "core.not-registered";
/// Kind identifier reported by [`CoreError::InvalidState`].
pub const INVALID_STATE_KIND: &str = "core.invalid-state";
/// Kind identifier reported by [`CoreError::TransactionTimeout`].
pub const TRANSACTION_TIMEOUT_KIND: &str = "core.transaction-timeout";
/// Kind identifier reported by configuration errors.
pub const CONFIGURATION_KIND: &str = "core.configuration";

/// A classified failure raised by downstream work or a resource driver.
///
/// Implementations identify themselves with a stable kind string and may
/// report ancestor kinds through [`Failure::is_kind_of`], so callers with an
/// open-ended failure taxonomy can still participate in commit allow-list
/// matching.
pub trait Failure: StdError + Send + Sync + 'static {
    /// Stable identifier of this failure's most specific kind.
    fn kind(&self) -> &str;

    /// Returns true if `kind` names this failure's kind or an ancestor kind.
    fn is_kind_of(&self, kind: &str) -> bool {
        self.kind() == kind
    }

    /// Severity category; fatal failures are never committed.
    fn severity(&self) -> Severity {
        Severity::Recoverable
    }

    /// Whether an outer handler may retry the operation that raised this
    /// failure.
    fn is_retryable(&self) -> bool {
        false
    }
}

/// Errors that can occur in demarc core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A transaction name was registered twice in the same execution scope.
    #[error("transaction name already registered in execution scope: {name}")]
    DuplicateRegistration {
        /// The transaction name that was already taken.
        name: String,
    },

    /// A transaction name was looked up but never registered.
    #[error("transaction name not registered in execution scope: {name}")]
    NotRegistered {
        /// The transaction name that was missing.
        name: String,
    },

    /// A failure kind descriptor does not name a defined kind.
    #[error("unknown failure kind: {kind}")]
    UnknownKind {
        /// The unresolvable descriptor.
        kind: String,
    },

    /// A commit allow-list descriptor names a fatal failure kind.
    #[error("fatal failure kind cannot be allow-listed for commit: {kind}")]
    FatalCommitKind {
        /// The rejected descriptor.
        kind: String,
    },

    /// Operation not permitted in the current transaction state.
    #[error("invalid transaction state: {message}")]
    InvalidState {
        /// Description of the violation.
        message: String,
    },

    /// The transactional resource timed out.
    #[error("transaction timed out after {elapsed:?}")]
    TransactionTimeout {
        /// How long the transaction had been running.
        elapsed: Duration,
    },

    /// A classified failure raised by downstream work or a resource driver.
    #[error("{0}")]
    Work(Box<dyn Failure>),
}

impl CoreError {
    /// Creates an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Creates a transaction timeout error.
    #[must_use]
    pub fn transaction_timeout(elapsed: Duration) -> Self {
        Self::TransactionTimeout { elapsed }
    }

    /// Wraps a classified failure.
    pub fn work(failure: impl Failure) -> Self {
        Self::Work(Box::new(failure))
    }

    /// Stable identifier of this error's most specific kind.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::DuplicateRegistration { .. } => DUPLICATE_REGISTRATION_KIND,
            Self::NotRegistered { .. } => NOT_REGISTERED_KIND,
            Self::UnknownKind { .. } | Self::FatalCommitKind { .. } => CONFIGURATION_KIND,
            Self::InvalidState { .. } => INVALID_STATE_KIND,
            Self::TransactionTimeout { .. } => TRANSACTION_TIMEOUT_KIND,
            Self::Work(failure) => failure.kind(),
        }
    }

    /// Returns true if `kind` names this error's kind or an ancestor kind.
    #[must_use]
    pub fn is_kind_of(&self, kind: &str) -> bool {
        match self {
            Self::Work(failure) => failure.is_kind_of(kind),
            _ => self.kind() == kind,
        }
    }

    /// Severity category of this error.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::Work(failure) => failure.severity(),
            _ => Severity::Recoverable,
        }
    }

    /// Whether an outer handler may retry the operation that failed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::TransactionTimeout { .. } => true,
            Self::Work(failure) => failure.is_retryable(),
            _ => false,
        }
    }
}
