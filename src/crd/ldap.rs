use super::common::{KubeAuthConfiguration, VaultConnection};
use super::credentials::CredentialReference;
use super::status::VaultObjectStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// LDAP auth method configuration at `auth/<path>/config`
///
/// Bind credentials are optional. Without any credential source the
/// method is configured for anonymous bind.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "LdapAuthEngineConfig",
    group = "vault.octopilot.io",
    version = "v1alpha1",
    namespaced,
    status = "VaultObjectStatus",
    shortname = "vldap",
    printcolumn = r#"{"name":"URL", "type":"string", "jsonPath":".spec.url"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct LdapAuthEngineConfigSpec {
    #[serde(default)]
    pub connection: Option<VaultConnection>,
    pub authentication: KubeAuthConfiguration,
    /// Mount path of the LDAP auth method
    #[serde(default = "default_ldap_path")]
    pub path: String,
    pub url: String,
    #[serde(default)]
    pub user_dn: Option<String>,
    #[serde(default)]
    pub user_attr: Option<String>,
    #[serde(default)]
    pub group_dn: Option<String>,
    #[serde(default)]
    pub group_filter: Option<String>,
    #[serde(default)]
    pub group_attr: Option<String>,
    #[serde(default)]
    pub upn_domain: Option<String>,
    #[serde(default)]
    pub starttls: bool,
    #[serde(default)]
    pub insecure_tls: bool,
    /// PEM CA certificate for the LDAP server
    #[serde(default)]
    pub certificate: Option<String>,
    /// Explicit bind DN; wins over the username stored with the credential
    #[serde(default)]
    pub bind_dn: Option<String>,
    #[serde(default)]
    pub bind_credentials: CredentialReference,
}

fn default_ldap_path() -> String {
    "ldap".to_string()
}
