use super::common::{KubeAuthConfiguration, VaultConnection};
use super::status::VaultObjectStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ACL policy stored at `sys/policies/acl/<name>`
///
/// The policy text may reference auth mount accessors as
/// `${auth/<mount>/@accessor}`; they are substituted before writing.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "Policy",
    group = "vault.octopilot.io",
    version = "v1alpha1",
    namespaced,
    status = "VaultObjectStatus",
    shortname = "vpol",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PolicySpec {
    #[serde(default)]
    pub connection: Option<VaultConnection>,
    pub authentication: KubeAuthConfiguration,
    /// Policy name in Vault; defaults to the object name
    #[serde(default)]
    pub name: Option<String>,
    /// HCL policy document
    pub policy: String,
}
