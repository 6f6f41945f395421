//! # Demarc Testkit
//!
//! Test doubles and fixtures for demarc.
//!
//! This crate provides:
//! - Journaling mock transactions with scriptable failures
//! - A scriptable transaction factory
//! - Recording and failing transaction-end listeners
//! - Classified test failures with explicit ancestor chains
//! - A failure catalog fixture and proptest generators
//!
//! ## Usage
//!
//! ```rust,ignore
//! use demarc_testkit::prelude::*;
//!
//! #[test]
//! fn commits_on_success() {
//!     let log = OpLog::new();
//!     let factory = MockTransactionFactory::new(log.clone());
//!     // ... drive the middleware, then:
//!     assert_eq!(log.ops(), vec![TxOp::Begin, TxOp::Commit]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod failures;
pub mod generators;
pub mod listeners;
pub mod transactions;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::failures::*;
    pub use crate::generators::*;
    pub use crate::listeners::*;
    pub use crate::transactions::*;
}

pub use failures::*;
pub use generators::*;
pub use listeners::*;
pub use transactions::*;
