use super::common::{KubeAuthConfiguration, VaultConnection};
use super::credentials::CredentialReference;
use super::status::VaultObjectStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Database secrets engine connection at `<path>/config/<name>`
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "DatabaseSecretEngineConfig",
    group = "vault.octopilot.io",
    version = "v1alpha1",
    namespaced,
    status = "VaultObjectStatus",
    shortname = "vdbc",
    printcolumn = r#"{"name":"Plugin", "type":"string", "jsonPath":".spec.pluginName"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSecretEngineConfigSpec {
    #[serde(default)]
    pub connection: Option<VaultConnection>,
    pub authentication: KubeAuthConfiguration,
    /// Mount path of the database secrets engine
    pub path: String,
    /// Connection name; defaults to the object name
    #[serde(default)]
    pub name: Option<String>,
    pub plugin_name: String,
    #[serde(default)]
    pub plugin_version: Option<String>,
    /// Connection URL template, usually with `{{username}}` and `{{password}}`
    pub connection_url: String,
    #[serde(default = "default_true")]
    pub verify_connection: bool,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    #[serde(default)]
    pub root_rotation_statements: Vec<String>,
    #[serde(default)]
    pub password_policy: Option<String>,
    #[serde(default)]
    pub username_template: Option<String>,
    #[serde(default)]
    pub max_open_connections: Option<i32>,
    /// Explicit root username; wins over the username stored with the credential
    #[serde(default)]
    pub username: Option<String>,
    pub root_credentials: CredentialReference,
}

fn default_true() -> bool {
    true
}
