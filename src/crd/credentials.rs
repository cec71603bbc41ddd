//! Credential reference as it appears in a resource spec

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Where a credential comes from
///
/// At most one of `secret`, `vaultSecret` and `randomSecret` may be set.
/// The resolver converts this into a tagged source and rejects ambiguity
/// before any lookup.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialReference {
    /// Name of a Kubernetes secret in the resource namespace
    #[serde(default)]
    pub secret: Option<String>,
    /// Path of a secret stored in Vault
    #[serde(default)]
    pub vault_secret: Option<String>,
    /// Name of a `RandomSecret` in the resource namespace
    #[serde(default)]
    pub random_secret: Option<String>,
    /// Overrides the default key holding the identity
    #[serde(default)]
    pub username_key: Option<String>,
    /// Overrides the default key holding the secret value
    #[serde(default)]
    pub password_key: Option<String>,
}

impl CredentialReference {
    #[must_use]
    pub fn local_secret(name: impl Into<String>) -> Self {
        Self {
            secret: Some(name.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn vault_secret(path: impl Into<String>) -> Self {
        Self {
            vault_secret: Some(path.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn random_secret(name: impl Into<String>) -> Self {
        Self {
            random_secret: Some(name.into()),
            ..Self::default()
        }
    }

    /// Names of the source fields that are set, in declaration order
    #[must_use]
    pub fn sources_set(&self) -> Vec<&'static str> {
        [
            ("secret", self.secret.is_some()),
            ("vaultSecret", self.vault_secret.is_some()),
            ("randomSecret", self.random_secret.is_some()),
        ]
        .into_iter()
        .filter_map(|(field, set)| set.then_some(field))
        .collect()
    }
}
