//! # Prelude
//!
//! Re-exports commonly used types and traits.
//!
//! ```rust
//! use vault_config_operator::prelude::*;
//! ```

// CRD types
pub use crate::crd::*;

// Seams and their dependency bundle
pub use crate::clients::Clients;
pub use crate::store::{ObjectStore, SecretData, StoreError};
pub use crate::vault::{Payload, VaultClient, VaultError, VaultSession, VaultTarget};

// Engine and resource contract
pub use crate::controller::reconciler::{
    DeleteOutcome, Engine, ManagedResource, ReconcileError, Reconciler, ReconcilerError,
    SyncOutcome,
};
pub use crate::resource::{Comparison, VaultObject};

pub use crate::config::{ControllerConfig, VaultDefaults};
pub use crate::credentials::{CredentialError, CredentialResolver, ResolvedCredential};
pub use crate::validation::ValidationError;
