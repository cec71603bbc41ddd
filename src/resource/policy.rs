//! ACL policies at `sys/policies/acl/<name>`
//!
//! Policy documents may reference auth mount accessors with
//! `${auth/<mount>/@accessor}`. Those placeholders are resolved against
//! `sys/auth` during prepare, so the rendered document is what gets compared.

use super::{InternalValues, PrepareContext, VaultObject};
use crate::controller::reconciler::ReconcileError;
use crate::crd::{KubeAuthConfiguration, Policy, VaultConnection, VaultObjectStatus};
use crate::validation::{require_non_empty, ValidationError};
use crate::vault::{string_field, Payload};
use async_trait::async_trait;
use kube::ResourceExt;
use regex::Regex;
use std::sync::LazyLock;
use vault_paths::builder::VaultPath;
use vault_paths::errors::PathBuilderError;
use vault_paths::operations::SYS_AUTH;

static ACCESSOR_PLACEHOLDER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\$\{auth/(?P<mount>[^}]+?)/@accessor\}").ok());

const POLICY_KEY: &str = "policy";

/// Auth mounts referenced by accessor placeholders, in order of appearance
#[must_use]
pub fn referenced_auth_mounts(policy: &str) -> Vec<String> {
    let Some(pattern) = ACCESSOR_PLACEHOLDER.as_ref() else {
        return Vec::new();
    };
    let mut mounts: Vec<String> = Vec::new();
    for captures in pattern.captures_iter(policy) {
        let mount = captures["mount"].to_string();
        if !mounts.contains(&mount) {
            mounts.push(mount);
        }
    }
    mounts
}

/// Replace accessor placeholders using a `sys/auth` listing
///
/// # Errors
///
/// Names the first referenced mount that has no accessor.
pub fn render_accessors(policy: &str, auth_table: &Payload) -> Result<String, String> {
    let Some(pattern) = ACCESSOR_PLACEHOLDER.as_ref() else {
        return Ok(policy.to_string());
    };
    for mount in referenced_auth_mounts(policy) {
        let accessor = auth_table
            .get(&format!("{mount}/"))
            .and_then(|entry| entry.as_object())
            .and_then(|entry| string_field(entry, "accessor"));
        if accessor.is_none() {
            return Err(mount);
        }
    }
    Ok(pattern
        .replace_all(policy, |captures: &regex::Captures<'_>| {
            auth_table
                .get(&format!("{}/", &captures["mount"]))
                .and_then(|entry| entry.as_object())
                .and_then(|entry| string_field(entry, "accessor"))
                .unwrap_or_default()
                .to_string()
        })
        .into_owned())
}

#[async_trait]
impl VaultObject for Policy {
    fn connection(&self) -> Option<&VaultConnection> {
        self.spec.connection.as_ref()
    }

    fn authentication(&self) -> &KubeAuthConfiguration {
        &self.spec.authentication
    }

    fn vault_path(&self) -> Result<String, PathBuilderError> {
        VaultPath::new()
            .segment("sys/policies/acl")
            .name(self.spec.name.as_deref(), &self.name_any())
            .require_name()
            .build()
    }

    fn payload(&self, internal: &InternalValues) -> Payload {
        let policy = internal
            .rendered
            .get(POLICY_KEY)
            .cloned()
            .unwrap_or_else(|| self.spec.policy.clone());
        let mut payload = Payload::new();
        payload.insert(POLICY_KEY.to_string(), policy.into());
        payload
    }

    fn status(&self) -> Option<&VaultObjectStatus> {
        self.status.as_ref()
    }

    fn comparison(&self) -> super::Comparison {
        super::Comparison::Keys(&[POLICY_KEY])
    }

    fn is_valid(&self) -> Result<(), ValidationError> {
        self.vault_path()?;
        require_non_empty("spec.policy", &self.spec.policy)
    }

    async fn prepare_internal_values(
        &self,
        ctx: &PrepareContext<'_>,
    ) -> Result<InternalValues, ReconcileError> {
        let mut internal = InternalValues::default();
        if referenced_auth_mounts(&self.spec.policy).is_empty() {
            return Ok(internal);
        }
        let auth_table = ctx
            .vault
            .read(ctx.session, SYS_AUTH)
            .await?
            .unwrap_or_default();
        let rendered = render_accessors(&self.spec.policy, &auth_table).map_err(|mount| {
            ReconcileError::AwaitingExternalInput(format!(
                "auth mount '{mount}' referenced by the policy does not exist"
            ))
        })?;
        internal.rendered.insert(POLICY_KEY.to_string(), rendered);
        Ok(internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::PolicySpec;
    use serde_json::json;

    fn policy(name: Option<&str>, document: &str) -> Policy {
        let mut policy = Policy::new(
            "readers",
            PolicySpec {
                connection: None,
                authentication: KubeAuthConfiguration::for_role("operator"),
                name: name.map(str::to_string),
                policy: document.to_string(),
            },
        );
        policy.metadata.namespace = Some("team-a".to_string());
        policy
    }

    fn auth_table() -> Payload {
        match json!({
            "kubernetes/": {"type": "kubernetes", "accessor": "auth_kubernetes_1234"},
            "ldap/": {"type": "ldap", "accessor": "auth_ldap_99"}
        }) {
            serde_json::Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[test]
    fn test_path_uses_override_name() {
        assert_eq!(policy(None, "x").path(), "sys/policies/acl/readers");
        assert_eq!(
            policy(Some("team-readers"), "x").path(),
            "sys/policies/acl/team-readers"
        );
    }

    #[test]
    fn test_empty_policy_is_invalid() {
        assert!(policy(None, " ").is_valid().is_err());
        assert!(policy(None, "path \"kv/*\" {}").is_valid().is_ok());
    }

    #[test]
    fn test_render_accessors() {
        let document = r#"path "identity/entity-alias/${auth/kubernetes/@accessor}" {} # ${auth/kubernetes/@accessor}"#;
        assert_eq!(referenced_auth_mounts(document), vec!["kubernetes".to_string()]);
        let rendered = render_accessors(document, &auth_table()).unwrap();
        assert!(!rendered.contains("${"));
        assert_eq!(rendered.matches("auth_kubernetes_1234").count(), 2);
    }

    #[test]
    fn test_render_accessors_missing_mount() {
        let document = "${auth/oidc/@accessor}";
        assert_eq!(render_accessors(document, &auth_table()), Err("oidc".to_string()));
    }

    #[test]
    fn test_equivalence_ignores_name_field() {
        let object = policy(None, "path \"kv/*\" {}");
        let internal = InternalValues::default();
        let observed = match json!({"name": "readers", "policy": "path \"kv/*\" {}"}) {
            serde_json::Value::Object(map) => map,
            _ => Payload::new(),
        };
        assert!(object.is_equivalent_to_desired_state(&internal, &observed));
    }
}
