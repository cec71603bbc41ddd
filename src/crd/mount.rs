//! Secret engine and auth method mounts

use super::common::{KubeAuthConfiguration, VaultConnection};
use super::status::VaultObjectStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fields common to secret engine and auth method mounts
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MountDefinition {
    /// Parent path; the mount lives at `<path>/<name>`
    #[serde(default)]
    pub path: String,
    /// Mount name; defaults to the object name
    #[serde(default)]
    pub name: Option<String>,
    /// Engine or method type, e.g. `kv`, `pki`, `ldap`. Immutable once mounted.
    #[serde(rename = "type")]
    pub engine_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub config: MountConfig,
    #[serde(default)]
    pub local: bool,
    #[serde(default)]
    pub seal_wrap: bool,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

/// Tunable mount configuration
///
/// TTLs accept duration strings (`1h`, `30m`) and are sent as integer seconds,
/// which is the unit Vault reports back from `tune`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MountConfig {
    #[serde(default)]
    pub default_lease_ttl: Option<String>,
    #[serde(default)]
    pub max_lease_ttl: Option<String>,
    #[serde(default)]
    pub force_no_cache: Option<bool>,
    #[serde(default)]
    pub audit_non_hmac_request_keys: Vec<String>,
    #[serde(default)]
    pub audit_non_hmac_response_keys: Vec<String>,
    /// `unauth` or `hidden`
    #[serde(default)]
    pub listing_visibility: Option<String>,
    #[serde(default)]
    pub passthrough_request_headers: Vec<String>,
    #[serde(default)]
    pub allowed_response_headers: Vec<String>,
}

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "SecretEngineMount",
    group = "vault.octopilot.io",
    version = "v1alpha1",
    namespaced,
    status = "VaultObjectStatus",
    shortname = "vsem",
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.type"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SecretEngineMountSpec {
    #[serde(default)]
    pub connection: Option<VaultConnection>,
    pub authentication: KubeAuthConfiguration,
    #[serde(flatten)]
    pub mount: MountDefinition,
    #[serde(default)]
    pub external_entropy_access: bool,
}

#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "AuthEngineMount",
    group = "vault.octopilot.io",
    version = "v1alpha1",
    namespaced,
    status = "VaultObjectStatus",
    shortname = "vaem",
    printcolumn = r#"{"name":"Type", "type":"string", "jsonPath":".spec.type"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AuthEngineMountSpec {
    #[serde(default)]
    pub connection: Option<VaultConnection>,
    pub authentication: KubeAuthConfiguration,
    #[serde(flatten)]
    pub mount: MountDefinition,
}
