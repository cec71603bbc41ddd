use super::common::{KubeAuthConfiguration, VaultConnection};
use super::status::VaultObjectStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Secret value generated from a Vault password policy and stored in a kv engine
///
/// Other resources can consume it through a `randomSecret` credential reference.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "RandomSecret",
    group = "vault.octopilot.io",
    version = "v1alpha1",
    namespaced,
    status = "VaultObjectStatus",
    shortname = "vrs",
    printcolumn = r#"{"name":"Last Update", "type":"string", "jsonPath":".status.lastVaultSecretUpdate"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RandomSecretSpec {
    #[serde(default)]
    pub connection: Option<VaultConnection>,
    pub authentication: KubeAuthConfiguration,
    /// kv engine mount path
    pub path: String,
    /// Secret name; defaults to the object name
    #[serde(default)]
    pub name: Option<String>,
    /// Key under which the generated value is stored
    pub secret_key: String,
    pub secret_format: PasswordPolicyFormat,
    /// Target engine is kv version 2
    #[serde(default, rename = "kvSecretEngineV2")]
    pub kv_secret_engine_v2: bool,
    /// Regenerate after this duration (`30d`, `12h`); never when absent
    #[serde(default)]
    pub refresh_period: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordPolicyFormat {
    pub password_policy_name: String,
}
