//! # Object Store
//!
//! The Kubernetes-side seam: local secret lookups, companion secret writes,
//! cross-resource reads and service account tokens. The kube implementation
//! lives in [`KubeObjectStore`]; tests use an in-memory one.

mod kubernetes;

pub use kubernetes::KubeObjectStore;

use crate::crd::{PkiSecretEngineConfig, RandomSecret};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use std::collections::BTreeMap;
use thiserror::Error;
use zeroize::Zeroizing;

/// Decoded `data` of a Kubernetes secret
pub type SecretData = BTreeMap<String, Vec<u8>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("service account {namespace}/{name} was issued no token")]
    MissingToken { namespace: String, name: String },

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Kubernetes operations the operator needs outside its own watch loop
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch a secret's data. `Ok(None)` when the secret does not exist.
    async fn get_secret(&self, namespace: &str, name: &str)
        -> Result<Option<SecretData>, StoreError>;

    /// Create a secret. Fails with [`StoreError::AlreadyExists`] on a name clash.
    async fn create_secret(&self, secret: Secret) -> Result<(), StoreError>;

    /// Delete a secret; an absent secret is not an error
    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError>;

    async fn get_random_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RandomSecret>, StoreError>;

    async fn get_pki_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PkiSecretEngineConfig>, StoreError>;

    /// Request a short-lived token for a service account (TokenRequest API)
    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
        audiences: &[String],
        ttl_secs: i64,
    ) -> Result<Zeroizing<String>, StoreError>;
}
