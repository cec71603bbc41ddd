//! # Runtime
//!
//! - `initialization`: process startup
//! - `watch_loop`: per-kind controllers and the shared reconciliation pass
//! - `error_policy`: requeue decisions and watch error handling

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use initialization::{initialize, InitializationResult};
pub use watch_loop::{reconcile, run_controllers};
