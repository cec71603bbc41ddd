//! # Controller
//!
//! - `pki`: certificate authority lifecycle
//! - `reconciler`: engine, errors, status and finalizer handling
//! - `server`: HTTP server for metrics and health checks
//!
//! The `crdgen` binary lives alongside but is not part of the library.

pub mod pki;
pub mod reconciler;
pub mod server;
