//! # Reconciler
//!
//! The kind-agnostic engine, its error taxonomy, status bookkeeping and the
//! shared controller context.

mod engine;
mod error;
pub mod finalizer;
mod managed;
pub mod status;
mod types;

pub use engine::{DeleteOutcome, Engine, SyncOutcome};
pub use error::{ReconcileError, ReconcilerError, RetryPolicy};
pub use managed::{ManagedResource, PassOutcome};
pub use types::{BackoffState, Reconciler};
