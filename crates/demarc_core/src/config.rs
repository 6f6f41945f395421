//! Middleware configuration.

use crate::transaction::DEFAULT_TRANSACTION_NAME;

/// Configuration for a [`TransactionHandler`](crate::TransactionHandler).
///
/// The commit allow-list is validated against the failure catalog when the
/// handler is built, never at transaction time.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Registration name for the managed transaction.
    pub transaction_name: String,

    /// Failure kinds that commit the transaction even when raised.
    ///
    /// Empty means every failure rolls back.
    pub commit_on_kinds: Vec<String>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            transaction_name: DEFAULT_TRANSACTION_NAME.to_owned(),
            commit_on_kinds: Vec::new(),
        }
    }
}

impl HandlerConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the registration name for the managed transaction.
    #[must_use]
    pub fn transaction_name(mut self, name: impl Into<String>) -> Self {
        self.transaction_name = name.into();
        self
    }

    /// Adds a failure kind that commits the transaction when raised.
    #[must_use]
    pub fn commit_on_kind(mut self, kind: impl Into<String>) -> Self {
        self.commit_on_kinds.push(kind.into());
        self
    }

    /// Replaces the commit allow-list.
    #[must_use]
    pub fn commit_on_kinds<I, S>(mut self, kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.commit_on_kinds = kinds.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = HandlerConfig::default();
        assert_eq!(config.transaction_name, DEFAULT_TRANSACTION_NAME);
        assert!(config.commit_on_kinds.is_empty());
    }

    #[test]
    fn builder_pattern() {
        let config = HandlerConfig::new()
            .transaction_name("batch")
            .commit_on_kind("app.error.business")
            .commit_on_kind("app.error.validation");

        assert_eq!(config.transaction_name, "batch");
        assert_eq!(
            config.commit_on_kinds,
            vec!["app.error.business", "app.error.validation"]
        );
    }

    #[test]
    fn replacing_the_allow_list() {
        let config = HandlerConfig::new()
            .commit_on_kind("app.old")
            .commit_on_kinds(["app.new"]);

        assert_eq!(config.commit_on_kinds, vec!["app.new"]);
    }
}
