//! Classified test failures and catalog fixtures.

use demarc_core::{CoreError, Failure, FailureCatalog, Severity};
use thiserror::Error;

/// A classified failure for tests, with an explicit ancestor chain.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TestFailure {
    /// Kind chain, most specific first.
    kinds: Vec<String>,
    severity: Severity,
    retryable: bool,
    message: String,
}

impl TestFailure {
    /// Creates a recoverable failure of `kind`.
    #[must_use]
    pub fn new(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        let message = format!("test failure: {kind}");
        Self {
            kinds: vec![kind],
            severity: Severity::Recoverable,
            retryable: false,
            message,
        }
    }

    /// Creates a fatal failure of `kind`.
    #[must_use]
    pub fn fatal(kind: impl Into<String>) -> Self {
        let mut failure = Self::new(kind);
        failure.severity = Severity::Fatal;
        failure
    }

    /// Appends an ancestor kind to the chain.
    #[must_use]
    pub fn with_ancestor(mut self, kind: impl Into<String>) -> Self {
        self.kinds.push(kind.into());
        self
    }

    /// Marks the failure retryable.
    #[must_use]
    pub fn retryable(mut self) -> Self {
        self.retryable = true;
        self
    }

    /// Wraps this failure into a [`CoreError`].
    #[must_use]
    pub fn into_error(self) -> CoreError {
        CoreError::work(self)
    }
}

impl Failure for TestFailure {
    fn kind(&self) -> &str {
        &self.kinds[0]
    }

    fn is_kind_of(&self, kind: &str) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// A catalog with the kinds the fixtures use:
///
/// - `app.error`: recoverable root
/// - `app.error.business`: child of `app.error`
/// - `app.error.business.duplicate`: child of `app.error.business`
/// - `app.fatal`: fatal root
#[must_use]
pub fn sample_catalog() -> FailureCatalog {
    let mut catalog = FailureCatalog::new();
    catalog.define("app.error", Severity::Recoverable);
    catalog
        .define_child("app.error.business", "app.error", Severity::Recoverable)
        .expect("parent is defined");
    catalog
        .define_child(
            "app.error.business.duplicate",
            "app.error.business",
            Severity::Recoverable,
        )
        .expect("parent is defined");
    catalog.define("app.fatal", Severity::Fatal);
    catalog
}
