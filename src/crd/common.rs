//! Connection and authentication fragments shared by every kind

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Optional override of the operator-wide Vault connection defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VaultConnection {
    /// Vault address, e.g. `https://vault.example.com:8200`
    #[serde(default)]
    pub address: Option<String>,
    /// Vault Enterprise namespace
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

/// TLS settings for the Vault connection
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    /// Secret in the resource namespace whose `ca.crt` key holds a PEM bundle
    #[serde(default)]
    pub ca_secret: Option<String>,
    /// Disable certificate verification (testing only)
    #[serde(default)]
    pub skip_verify: bool,
}

/// Kubernetes auth method login
///
/// A short-lived token for `serviceAccount` is exchanged for a Vault token
/// at `auth/<path>/login` using `role`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KubeAuthConfiguration {
    #[serde(default)]
    pub service_account: ServiceAccountRef,
    /// Mount path of the Kubernetes auth method
    #[serde(default = "default_auth_path")]
    pub path: String,
    /// Vault role to log in with
    pub role: String,
    /// Vault namespace to log in to, if different from the connection namespace
    #[serde(default)]
    pub namespace: Option<String>,
    /// Audiences requested for the service account token
    #[serde(default)]
    pub audiences: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccountRef {
    #[serde(default = "default_service_account")]
    pub name: String,
}

impl Default for ServiceAccountRef {
    fn default() -> Self {
        Self {
            name: default_service_account(),
        }
    }
}

impl KubeAuthConfiguration {
    /// Auth configuration with defaults for everything except the role
    #[must_use]
    pub fn for_role(role: impl Into<String>) -> Self {
        Self {
            service_account: ServiceAccountRef::default(),
            path: default_auth_path(),
            role: role.into(),
            namespace: None,
            audiences: Vec::new(),
        }
    }
}

fn default_auth_path() -> String {
    "kubernetes".to_string()
}

fn default_service_account() -> String {
    "default".to_string()
}
