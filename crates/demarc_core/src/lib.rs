//! # Demarc Core
//!
//! Transactional demarcation for units of work executed inside a
//! request-processing pipeline.
//!
//! This crate provides:
//! - A transaction capability seam ([`Transaction`], [`TransactionFactory`])
//! - An execution-scoped transaction registry
//! - A commit-override policy driven by classified failure kinds
//! - A begin/commit/rollback executor with two-level failure handling
//! - The orchestrating middleware, including a recovery transaction that
//!   durably commits abnormal-end cleanup after a rollback
//!
//! # Usage
//!
//! ```rust,ignore
//! use demarc_core::{
//!     ExecutionContext, FailureCatalog, HandlerConfig, Severity, TransactionHandler,
//! };
//!
//! let mut catalog = FailureCatalog::new();
//! catalog.define("app.validation", Severity::Recoverable);
//!
//! let handler = TransactionHandler::new(
//!     factory,
//!     HandlerConfig::new().commit_on_kind("app.validation"),
//!     &catalog,
//! )?;
//!
//! let mut ctx = ExecutionContext::new();
//! let completion = handler.handle(&request, &mut ctx, |request, ctx| {
//!     // downstream unit of work; the active transaction is reachable
//!     // through ctx.registry()
//!     process(request, ctx)
//! })?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod error;
mod executor;
mod handler;
mod listener;
mod policy;
mod registry;
mod transaction;

pub use config::HandlerConfig;
pub use context::ExecutionContext;
pub use error::{
    CoreError, CoreResult, Failure, Severity, CONFIGURATION_KIND, DUPLICATE_REGISTRATION_KIND,
    INVALID_STATE_KIND, NOT_REGISTERED_KIND, TRANSACTION_TIMEOUT_KIND,
};
pub use executor::{Completion, ErrorAction, ExecutorState, TransactionExecutor, TransactionWork};
pub use handler::TransactionHandler;
pub use listener::TransactionEventListener;
pub use policy::{CommitPolicy, FailureCatalog};
pub use registry::TransactionRegistry;
pub use transaction::{
    SharedTransaction, Transaction, TransactionFactory, DEFAULT_TRANSACTION_NAME,
};
