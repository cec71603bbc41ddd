//! Database secrets engine connection at `<path>/config/<name>`
//!
//! The root credential is resolved on every pass. Vault never returns the
//! password and nests connection settings under `connection_details` on
//! read, so the observed payload is flattened before comparison.

use super::{put_list, put_str, Comparison, InternalValues, PrepareContext, VaultObject};
use crate::controller::reconciler::ReconcileError;
use crate::credentials::{CredentialDefaults, CredentialSource};
use crate::crd::{DatabaseSecretEngineConfig, KubeAuthConfiguration, VaultConnection, VaultObjectStatus};
use crate::validation::{require_non_empty, ValidationError};
use crate::vault::Payload;
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;
use vault_paths::builder::VaultPath;
use vault_paths::errors::PathBuilderError;

const REDACTED: &[&str] = &["password"];

/// Observed field names that differ from the write API
const OBSERVED_RENAMES: &[(&str, &str)] = &[("root_credentials_rotate_statements", "root_rotation_statements")];

/// Lift `connection_details` to the top level and align renamed fields
#[must_use]
pub fn flatten_observed(mut observed: Payload) -> Payload {
    if let Some(Value::Object(details)) = observed.remove("connection_details") {
        for (key, value) in details {
            observed.entry(key).or_insert(value);
        }
    }
    for (observed_key, desired_key) in OBSERVED_RENAMES {
        if let Some(value) = observed.remove(*observed_key) {
            observed.entry((*desired_key).to_string()).or_insert(value);
        }
    }
    observed
}

#[async_trait]
impl VaultObject for DatabaseSecretEngineConfig {
    fn connection(&self) -> Option<&VaultConnection> {
        self.spec.connection.as_ref()
    }

    fn authentication(&self) -> &KubeAuthConfiguration {
        &self.spec.authentication
    }

    fn vault_path(&self) -> Result<String, PathBuilderError> {
        VaultPath::new()
            .segment(self.spec.path.as_str())
            .segment("config")
            .name(self.spec.name.as_deref(), &self.name_any())
            .require_name()
            .build()
    }

    fn payload(&self, internal: &InternalValues) -> Payload {
        let spec = &self.spec;
        let mut payload = Payload::new();
        payload.insert("plugin_name".to_string(), spec.plugin_name.clone().into());
        put_str(&mut payload, "plugin_version", spec.plugin_version.as_deref());
        payload.insert("connection_url".to_string(), spec.connection_url.clone().into());
        payload.insert("verify_connection".to_string(), spec.verify_connection.into());
        put_list(&mut payload, "allowed_roles", &spec.allowed_roles);
        put_list(&mut payload, "root_rotation_statements", &spec.root_rotation_statements);
        put_str(&mut payload, "password_policy", spec.password_policy.as_deref());
        put_str(&mut payload, "username_template", spec.username_template.as_deref());
        if let Some(max_open_connections) = spec.max_open_connections {
            payload.insert("max_open_connections".to_string(), max_open_connections.into());
        }
        if let Some(credential) = &internal.credential {
            payload.insert("username".to_string(), credential.identity.clone().into());
            payload.insert("password".to_string(), credential.secret().into());
        }
        payload
    }

    fn status(&self) -> Option<&VaultObjectStatus> {
        self.status.as_ref()
    }

    fn redacted_keys(&self) -> &'static [&'static str] {
        REDACTED
    }

    fn comparison(&self) -> Comparison {
        Comparison::DesiredKeys
    }

    fn normalize_observed(&self, observed: Payload) -> Payload {
        flatten_observed(observed)
    }

    fn is_valid(&self) -> Result<(), ValidationError> {
        self.vault_path()?;
        require_non_empty("spec.pluginName", &self.spec.plugin_name)?;
        require_non_empty("spec.connectionUrl", &self.spec.connection_url)?;
        CredentialSource::from_reference(&self.spec.root_credentials)
            .map_err(|e| ValidationError::invalid("spec.rootCredentials", e.to_string()))?;
        Ok(())
    }

    async fn prepare_internal_values(
        &self,
        ctx: &PrepareContext<'_>,
    ) -> Result<InternalValues, ReconcileError> {
        let credential = ctx
            .resolver
            .resolve(
                ctx.scope(),
                &self.spec.root_credentials,
                self.spec.username.as_deref(),
                CredentialDefaults::REQUIRED,
            )
            .await?;
        Ok(InternalValues {
            credential,
            ..InternalValues::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::ResolvedCredential;
    use crate::crd::{CredentialReference, DatabaseSecretEngineConfigSpec};
    use serde_json::json;

    fn config() -> DatabaseSecretEngineConfig {
        DatabaseSecretEngineConfig::new(
            "orders-db",
            DatabaseSecretEngineConfigSpec {
                connection: None,
                authentication: KubeAuthConfiguration::for_role("operator"),
                path: "/database/".to_string(),
                name: None,
                plugin_name: "postgresql-database-plugin".to_string(),
                plugin_version: None,
                connection_url: "postgresql://{{username}}:{{password}}@db:5432/orders".to_string(),
                verify_connection: true,
                allowed_roles: vec!["orders-rw".to_string()],
                root_rotation_statements: Vec::new(),
                password_policy: None,
                username_template: None,
                max_open_connections: Some(4),
                username: None,
                root_credentials: CredentialReference::local_secret("orders-db-root"),
            },
        )
    }

    fn internal() -> InternalValues {
        InternalValues {
            credential: Some(ResolvedCredential::new("admin", "s3cret")),
            ..InternalValues::default()
        }
    }

    #[test]
    fn test_path_is_cleansed() {
        assert_eq!(config().path(), "database/config/orders-db");
    }

    #[test]
    fn test_payload_carries_credential() {
        let payload = config().payload(&internal());
        assert_eq!(payload["username"], json!("admin"));
        assert_eq!(payload["password"], json!("s3cret"));
        assert_eq!(payload["allowed_roles"], json!(["orders-rw"]));
    }

    #[test]
    fn test_vault_read_shape_is_equivalent() {
        let observed = match json!({
            "plugin_name": "postgresql-database-plugin",
            "plugin_version": "",
            "allowed_roles": ["orders-rw"],
            "verify_connection": true,
            "root_credentials_rotate_statements": [],
            "password_policy": "",
            "connection_details": {
                "connection_url": "postgresql://{{username}}:{{password}}@db:5432/orders",
                "username": "admin",
                "max_open_connections": 4
            }
        }) {
            Value::Object(map) => map,
            _ => Payload::new(),
        };
        assert!(config().is_equivalent_to_desired_state(&internal(), &observed));

        let rotated = InternalValues {
            credential: Some(ResolvedCredential::new("other-admin", "s3cret")),
            ..InternalValues::default()
        };
        assert!(!config().is_equivalent_to_desired_state(&rotated, &observed));
    }

    #[test]
    fn test_ambiguous_credentials_invalid() {
        let mut object = config();
        object.spec.root_credentials.vault_secret = Some("kv/data/root".to_string());
        let error = object.is_valid().unwrap_err();
        assert!(error.to_string().contains("spec.rootCredentials"));
    }
}
