//! PKI secrets engine certificate authority

use super::common::{KubeAuthConfiguration, VaultConnection};
use super::status::PkiSecretEngineConfigStatus;
use crate::constants::DEFAULT_SIGNED_CERT_KEY;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Certificate authority hosted on a PKI mount
///
/// `type` and `privateKeyType` cannot change after the CA is generated.
///
/// # Example
///
/// ```yaml
/// apiVersion: vault.octopilot.io/v1alpha1
/// kind: PkiSecretEngineConfig
/// metadata:
///   name: intermediate
/// spec:
///   authentication:
///     role: pki-admin
///   path: pki-int
///   type: intermediate
///   privateKeyType: internal
///   commonName: Example Intermediate CA
///   internalSign:
///     name: root
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "PkiSecretEngineConfig",
    group = "vault.octopilot.io",
    version = "v1alpha1",
    namespaced,
    status = "PkiSecretEngineConfigStatus",
    shortname = "vpki",
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.type"}, {"name":"CA", "type":"string", "jsonPath":".status.caState.phase"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PkiSecretEngineConfigSpec {
    #[serde(default)]
    pub connection: Option<VaultConnection>,
    pub authentication: KubeAuthConfiguration,
    /// Mount path of the PKI engine
    pub path: String,
    #[serde(rename = "type")]
    pub ca_type: PkiCaType,
    #[serde(default)]
    pub private_key_type: PrivateKeyType,
    pub common_name: String,
    #[serde(default)]
    pub alt_names: Vec<String>,
    #[serde(default)]
    pub ip_sans: Vec<String>,
    #[serde(default)]
    pub uri_sans: Vec<String>,
    #[serde(default)]
    pub other_sans: Vec<String>,
    /// Requested validity, e.g. `8760h`
    #[serde(default)]
    pub ttl: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub private_key_format: Option<String>,
    #[serde(default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub key_bits: Option<i32>,
    #[serde(default)]
    pub exclude_cn_from_sans: bool,
    #[serde(default)]
    pub max_path_length: Option<i32>,
    #[serde(default)]
    pub permitted_dns_domains: Vec<String>,
    #[serde(default)]
    pub ou: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub issuing_certificates: Vec<String>,
    #[serde(default)]
    pub crl_distribution_points: Vec<String>,
    #[serde(default)]
    pub ocsp_servers: Vec<String>,
    /// Intermediate only: sign with another root CA managed by this operator
    #[serde(default)]
    pub internal_sign: Option<PkiReference>,
    /// Intermediate only: wait for an externally signed certificate in this secret
    #[serde(default)]
    pub external_sign_secret: Option<ExternalSignSecret>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PkiCaType {
    Root,
    Intermediate,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PrivateKeyType {
    #[default]
    Internal,
    Exported,
}

impl From<PkiCaType> for vault_paths::operations::CaType {
    fn from(value: PkiCaType) -> Self {
        match value {
            PkiCaType::Root => Self::Root,
            PkiCaType::Intermediate => Self::Intermediate,
        }
    }
}

impl From<PrivateKeyType> for vault_paths::operations::KeyMode {
    fn from(value: PrivateKeyType) -> Self {
        match value {
            PrivateKeyType::Internal => Self::Internal,
            PrivateKeyType::Exported => Self::Exported,
        }
    }
}

/// Reference to another `PkiSecretEngineConfig`
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PkiReference {
    pub name: String,
    /// Defaults to the namespace of the referencing resource
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Secret expected to hold the externally signed certificate
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSignSecret {
    pub name: String,
    #[serde(default = "default_signed_cert_key")]
    pub key: String,
}

fn default_signed_cert_key() -> String {
    DEFAULT_SIGNED_CERT_KEY.to_string()
}
