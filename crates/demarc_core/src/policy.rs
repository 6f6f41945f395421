//! Commit disposition policy for failed work.

use crate::error::{CoreError, CoreResult, Severity};
use std::collections::{HashMap, HashSet};

/// Configuration-time registry of known failure kinds.
///
/// Maps kind identifiers to a severity and an optional parent kind. The
/// catalog is only consulted while resolving a [`CommitPolicy`]; failures
/// observed at transaction time are matched against the resolved set.
#[derive(Debug, Clone, Default)]
pub struct FailureCatalog {
    kinds: HashMap<String, KindEntry>,
}

#[derive(Debug, Clone)]
struct KindEntry {
    parent: Option<String>,
    severity: Severity,
}

impl FailureCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a root failure kind.
    pub fn define(&mut self, name: impl Into<String>, severity: Severity) {
        self.kinds.insert(
            name.into(),
            KindEntry {
                parent: None,
                severity,
            },
        );
    }

    /// Defines a failure kind derived from `parent`.
    ///
    /// The parent must already be defined.
    pub fn define_child(
        &mut self,
        name: impl Into<String>,
        parent: &str,
        severity: Severity,
    ) -> CoreResult<()> {
        if !self.kinds.contains_key(parent) {
            return Err(CoreError::UnknownKind {
                kind: parent.to_owned(),
            });
        }
        self.kinds.insert(
            name.into(),
            KindEntry {
                parent: Some(parent.to_owned()),
                severity,
            },
        );
        Ok(())
    }

    /// Returns true if `name` is a defined kind.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.kinds.contains_key(name)
    }

    /// Severity of a defined kind.
    #[must_use]
    pub fn severity_of(&self, name: &str) -> Option<Severity> {
        self.kinds.get(name).map(|entry| entry.severity)
    }

    /// Returns true if `name` equals `ancestor` or derives from it.
    fn descends_from(&self, name: &str, ancestor: &str) -> bool {
        let mut current = Some(name);
        while let Some(kind) = current {
            if kind == ancestor {
                return true;
            }
            current = self
                .kinds
                .get(kind)
                .and_then(|entry| entry.parent.as_deref());
        }
        false
    }

    fn kind_names(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }
}

/// Decides whether a failed transaction should still be committed.
///
/// Failures whose kind (or any ancestor kind) appears in the configured
/// allow-list commit; everything else, and every fatal failure, rolls back.
/// The policy is resolved once at configuration time; nothing is validated
/// at transaction time.
#[derive(Debug, Clone, Default)]
pub struct CommitPolicy {
    /// Configured descriptors, in configuration order.
    descriptors: Vec<String>,
    /// Catalog kinds matched by the descriptors, resolved up front for O(1)
    /// membership checks.
    resolved: HashSet<String>,
}

impl CommitPolicy {
    /// A policy with an empty allow-list: every failure rolls back.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolves an allow-list of failure kind descriptors against `catalog`.
    ///
    /// Fails immediately on a descriptor that is not a defined kind or that
    /// names a fatal kind; fatal failures are never allow-listed.
    pub fn resolve<I, S>(catalog: &FailureCatalog, descriptors: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policy = Self::default();
        for descriptor in descriptors {
            let descriptor = descriptor.into();
            match catalog.severity_of(&descriptor) {
                None => return Err(CoreError::UnknownKind { kind: descriptor }),
                Some(Severity::Fatal) => {
                    return Err(CoreError::FatalCommitKind { kind: descriptor })
                }
                Some(Severity::Recoverable) => {}
            }
            if !policy.descriptors.contains(&descriptor) {
                policy.descriptors.push(descriptor);
            }
        }
        for kind in catalog.kind_names() {
            if catalog.severity_of(kind) == Some(Severity::Fatal) {
                continue;
            }
            if policy
                .descriptors
                .iter()
                .any(|descriptor| catalog.descends_from(kind, descriptor))
            {
                policy.resolved.insert(kind.to_owned());
            }
        }
        Ok(policy)
    }

    /// Returns true if this policy can never commit on failure.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Decides whether the transaction should be committed even though
    /// `failure` was raised.
    ///
    /// Fatal failures never commit. Otherwise the failure commits iff its
    /// kind was resolved from the catalog, or it reports descent from a
    /// configured descriptor through [`CoreError::is_kind_of`] (the
    /// capability fallback for kinds the catalog has never seen).
    #[must_use]
    pub fn should_commit(&self, failure: &CoreError) -> bool {
        if failure.severity() == Severity::Fatal {
            return false;
        }
        if self.resolved.contains(failure.kind()) {
            return true;
        }
        self.descriptors
            .iter()
            .any(|descriptor| failure.is_kind_of(descriptor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use demarc_testkit::prelude::*;
    use proptest::prelude::*;

    fn business_policy() -> CommitPolicy {
        CommitPolicy::resolve(&sample_catalog(), ["app.error.business"]).unwrap()
    }

    #[test]
    fn empty_policy_never_commits() {
        let policy = CommitPolicy::empty();
        assert!(policy.is_empty());
        assert!(!policy.should_commit(&TestFailure::new("app.error").into_error()));
    }

    #[test]
    fn exact_kind_commits() {
        let policy = business_policy();
        assert!(policy.should_commit(&TestFailure::new("app.error.business").into_error()));
    }

    #[test]
    fn catalog_child_kind_commits() {
        // "app.error.business.duplicate" derives from the configured kind
        // through the catalog, without the failure reporting ancestors.
        let policy = business_policy();
        let failure = TestFailure::new("app.error.business.duplicate").into_error();
        assert!(policy.should_commit(&failure));
    }

    #[test]
    fn unrelated_kind_rolls_back() {
        let policy = business_policy();
        assert!(!policy.should_commit(&TestFailure::new("app.error").into_error()));
        assert!(!policy.should_commit(&TestFailure::new("io.timeout").into_error()));
    }

    #[test]
    fn uncataloged_kind_commits_via_ancestor_chain() {
        // The failure's own chain claims descent from the configured kind
        // even though the catalog never defined it.
        let policy = business_policy();
        let failure = TestFailure::new("app.error.business.rejected")
            .with_ancestor("app.error.business")
            .into_error();
        assert!(policy.should_commit(&failure));
    }

    #[test]
    fn fatal_failure_never_commits() {
        let policy = business_policy();
        let failure = TestFailure::fatal("app.error.business").into_error();
        assert!(!policy.should_commit(&failure));
    }

    #[test]
    fn unknown_descriptor_rejected_at_resolution() {
        let result = CommitPolicy::resolve(&sample_catalog(), ["app.unknown"]);
        assert!(matches!(
            result,
            Err(CoreError::UnknownKind { kind }) if kind == "app.unknown"
        ));
    }

    #[test]
    fn fatal_descriptor_rejected_at_resolution() {
        let result = CommitPolicy::resolve(&sample_catalog(), ["app.fatal"]);
        assert!(matches!(
            result,
            Err(CoreError::FatalCommitKind { kind }) if kind == "app.fatal"
        ));
    }

    #[test]
    fn catalog_rejects_child_of_undefined_parent() {
        let mut catalog = FailureCatalog::new();
        let result = catalog.define_child("app.child", "app.missing", Severity::Recoverable);
        assert!(matches!(result, Err(CoreError::UnknownKind { .. })));
    }

    proptest! {
        #[test]
        fn empty_policy_rejects_arbitrary_kinds(kind in failure_kind_strategy()) {
            let policy = CommitPolicy::empty();
            prop_assert!(!policy.should_commit(&TestFailure::new(kind).into_error()));
        }

        #[test]
        fn configured_kind_always_commits(kind in failure_kind_strategy()) {
            let mut catalog = FailureCatalog::new();
            catalog.define(kind.clone(), Severity::Recoverable);
            let policy = CommitPolicy::resolve(&catalog, [kind.clone()]).unwrap();
            prop_assert!(policy.should_commit(&TestFailure::new(kind).into_error()));
        }
    }
}
