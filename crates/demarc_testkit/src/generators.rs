//! Property-based test generators using proptest.

use proptest::prelude::*;

/// Strategy for generating valid transaction names.
pub fn transaction_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_-]{0,15}").expect("valid regex")
}

/// Strategy for generating dotted failure kind identifiers.
pub fn failure_kind_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z]{1,8}(\\.[a-z]{1,8}){0,3}").expect("valid regex")
}

/// A register-or-remove step for registry property tests.
#[derive(Debug, Clone)]
pub enum RegistryStep {
    /// Register a handle under the named slot.
    Register(String),
    /// Remove the named slot.
    Remove(String),
}

/// Strategy for generating step sequences over a small, colliding name
/// pool, so duplicate registrations and redundant removals actually occur.
pub fn registry_steps_strategy() -> impl Strategy<Value = Vec<RegistryStep>> {
    let name = prop::sample::select(vec![
        "transaction".to_owned(),
        "batch".to_owned(),
        "audit".to_owned(),
    ]);
    prop::collection::vec(
        (name, any::<bool>()).prop_map(|(name, register)| {
            if register {
                RegistryStep::Register(name)
            } else {
                RegistryStep::Remove(name)
            }
        }),
        0..24,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn kind_identifiers_are_dotted_lowercase(kind in failure_kind_strategy()) {
            prop_assert!(kind
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '.'));
        }

        #[test]
        fn names_start_with_a_letter(name in transaction_name_strategy()) {
            prop_assert!(name.chars().next().is_some_and(|c| c.is_ascii_lowercase()));
        }
    }
}
