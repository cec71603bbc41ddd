//! LDAP auth method configuration at `auth/<path>/config`
//!
//! The bind credential is optional: with no source set the method binds
//! anonymously (or with `bindDn` alone when given).

use super::{put_str, Comparison, InternalValues, PrepareContext, VaultObject};
use crate::controller::reconciler::ReconcileError;
use crate::credentials::{CredentialDefaults, CredentialSource};
use crate::crd::{KubeAuthConfiguration, LdapAuthEngineConfig, VaultConnection, VaultObjectStatus};
use crate::validation::{require_non_empty, ValidationError};
use crate::vault::Payload;
use async_trait::async_trait;
use vault_paths::builder::VaultPath;
use vault_paths::errors::PathBuilderError;

const REDACTED: &[&str] = &["bindpass"];

#[async_trait]
impl VaultObject for LdapAuthEngineConfig {
    fn connection(&self) -> Option<&VaultConnection> {
        self.spec.connection.as_ref()
    }

    fn authentication(&self) -> &KubeAuthConfiguration {
        &self.spec.authentication
    }

    fn vault_path(&self) -> Result<String, PathBuilderError> {
        VaultPath::new()
            .segment("auth")
            .segment(self.spec.path.as_str())
            .segment("config")
            .build()
    }

    fn payload(&self, internal: &InternalValues) -> Payload {
        let spec = &self.spec;
        let mut payload = Payload::new();
        payload.insert("url".to_string(), spec.url.clone().into());
        put_str(&mut payload, "userdn", spec.user_dn.as_deref());
        put_str(&mut payload, "userattr", spec.user_attr.as_deref());
        put_str(&mut payload, "groupdn", spec.group_dn.as_deref());
        put_str(&mut payload, "groupfilter", spec.group_filter.as_deref());
        put_str(&mut payload, "groupattr", spec.group_attr.as_deref());
        put_str(&mut payload, "upndomain", spec.upn_domain.as_deref());
        payload.insert("starttls".to_string(), spec.starttls.into());
        payload.insert("insecure_tls".to_string(), spec.insecure_tls.into());
        put_str(&mut payload, "certificate", spec.certificate.as_deref());
        match &internal.credential {
            Some(credential) => {
                payload.insert("binddn".to_string(), credential.identity.clone().into());
                payload.insert("bindpass".to_string(), credential.secret().into());
            }
            None => put_str(&mut payload, "binddn", spec.bind_dn.as_deref()),
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

    /// The config endpoint has no DELETE; it goes away with the auth mount
    fn is_deletable(&self) -> bool {
        false
    }

    fn is_valid(&self) -> Result<(), ValidationError> {
        self.vault_path()?;
        require_non_empty("spec.url", &self.spec.url)?;
        CredentialSource::from_reference(&self.spec.bind_credentials)
            .map_err(|e| ValidationError::invalid("spec.bindCredentials", e.to_string()))?;
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
                &self.spec.bind_credentials,
                self.spec.bind_dn.as_deref(),
                CredentialDefaults::OPTIONAL,
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
    use crate::crd::{CredentialReference, LdapAuthEngineConfigSpec};
    use serde_json::json;

    fn config() -> LdapAuthEngineConfig {
        LdapAuthEngineConfig::new(
            "corp-ldap",
            LdapAuthEngineConfigSpec {
                connection: None,
                authentication: KubeAuthConfiguration::for_role("operator"),
                path: "ldap".to_string(),
                url: "ldaps://ldap.corp:636".to_string(),
                user_dn: Some("ou=users,dc=corp".to_string()),
                user_attr: Some("uid".to_string()),
                group_dn: None,
                group_filter: None,
                group_attr: None,
                upn_domain: None,
                starttls: false,
                insecure_tls: false,
                certificate: None,
                bind_dn: Some("cn=vault,dc=corp".to_string()),
                bind_credentials: CredentialReference::default(),
            },
        )
    }

    #[test]
    fn test_path() {
        assert_eq!(config().path(), "auth/ldap/config");
    }

    #[test]
    fn test_not_deletable() {
        assert!(!config().is_deletable());
    }

    #[test]
    fn test_anonymous_bind_keeps_bind_dn() {
        let payload = config().payload(&InternalValues::default());
        assert_eq!(payload["binddn"], json!("cn=vault,dc=corp"));
        assert!(!payload.contains_key("bindpass"));
    }

    #[test]
    fn test_bindpass_never_compared() {
        let internal = InternalValues {
            credential: Some(ResolvedCredential::new("cn=vault,dc=corp", "pw")),
            ..InternalValues::default()
        };
        let observed = match json!({
            "url": "ldaps://ldap.corp:636",
            "userdn": "ou=users,dc=corp",
            "userattr": "uid",
            "binddn": "cn=vault,dc=corp",
            "starttls": false,
            "insecure_tls": false,
            "token_ttl": 0
        }) {
            serde_json::Value::Object(map) => map,
            _ => Payload::new(),
        };
        assert!(config().is_equivalent_to_desired_state(&internal, &observed));
    }
}
