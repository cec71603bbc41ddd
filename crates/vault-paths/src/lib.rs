//! Canonical Vault API paths
//!
//! This crate centralizes every path the operator sends to Vault so the
//! controller and its test doubles agree on the exact strings.
//!
//! ## Quick Start
//!
//! ```rust
//! use vault_paths::prelude::*;
//!
//! let path = VaultPath::new()
//!     .segment("sys/policies/acl")
//!     .name(None, "read-only")
//!     .build()
//!     .unwrap();
//! assert_eq!(path, "sys/policies/acl/read-only");
//! ```
//!
//! ## Cleansing
//!
//! All builders funnel through [`clean::cleanse`], which collapses repeated
//! separators and trims leading/trailing ones. Cleansing is idempotent.

pub mod builder;
pub mod clean;
pub mod errors;
pub mod operations;
pub mod prelude;
