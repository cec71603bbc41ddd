//! # Configuration
//!
//! Operator-level settings, loaded once at startup from the environment.

mod controller;

pub use controller::{ControllerConfig, VaultDefaults};
