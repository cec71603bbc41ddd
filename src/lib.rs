//! Vault Config Operator Library
//!
//! Reconciles declarative Vault configuration held in Kubernetes custom
//! resources: policies, secret and auth mounts, database and LDAP engine
//! configuration, generated secrets and PKI certificate authorities.
//!
//! ## Quick Start
//!
//! ```rust
//! use vault_config_operator::prelude::*;
//! ```

pub mod clients;
pub mod config;
pub mod constants;
pub mod controller;
pub mod credentials;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod resource;
pub mod runtime;
pub mod store;
pub mod validation;
pub mod vault;
