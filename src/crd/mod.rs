//! # Custom Resource Definitions
//!
//! Declarative Vault configuration kinds. Every kind embeds a
//! [`VaultConnection`] override and a [`KubeAuthConfiguration`].

mod common;
mod credentials;
mod database;
mod ldap;
mod mount;
mod pki;
mod policy;
mod random_secret;
mod status;

pub use common::{KubeAuthConfiguration, ServiceAccountRef, TlsConfig, VaultConnection};
pub use credentials::CredentialReference;
pub use database::{DatabaseSecretEngineConfig, DatabaseSecretEngineConfigSpec};
pub use ldap::{LdapAuthEngineConfig, LdapAuthEngineConfigSpec};
pub use mount::{
    AuthEngineMount, AuthEngineMountSpec, MountConfig, MountDefinition, SecretEngineMount,
    SecretEngineMountSpec,
};
pub use pki::{
    ExternalSignSecret, PkiCaType, PkiReference, PkiSecretEngineConfig,
    PkiSecretEngineConfigSpec, PrivateKeyType,
};
pub use policy::{Policy, PolicySpec};
pub use random_secret::{PasswordPolicyFormat, RandomSecret, RandomSecretSpec};
pub use status::{
    CaPhase, CaState, CaStateRecord, Condition, PkiSecretEngineConfigStatus, ReconcilePhase,
    VaultObjectStatus,
};
