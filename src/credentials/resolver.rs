//! Credential resolver
//!
//! Looks up the single source named by a reference and applies the
//! identity-override rule: an identity set on the referencing resource wins
//! over the identity stored next to the secret.

use super::{CredentialDefaults, CredentialError, CredentialSource, ResolvedCredential};
use crate::clients::Clients;
use crate::crd::CredentialReference;
use crate::observability::metrics;
use crate::resource::VaultObject;
use crate::store::SecretData;
use crate::vault::{unwrap_kv_data, Payload, VaultSession};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    clients: Clients,
}

/// Where a credential lookup happens
#[derive(Debug, Clone, Copy)]
pub struct ResolveScope<'a> {
    pub namespace: &'a str,
    pub session: &'a VaultSession,
}

impl CredentialResolver {
    #[must_use]
    pub fn new(clients: Clients) -> Self {
        Self { clients }
    }

    /// Resolve `reference` into an `(identity, secret)` pair.
    ///
    /// Returns `Ok(None)` only when no source is set and `defaults` allows
    /// the implicit default. Ambiguity is rejected before any lookup.
    ///
    /// # Errors
    ///
    /// See [`CredentialError`]; every lookup miss is terminal for this pass.
    pub async fn resolve(
        &self,
        scope: ResolveScope<'_>,
        reference: &CredentialReference,
        identity_override: Option<&str>,
        defaults: CredentialDefaults,
    ) -> Result<Option<ResolvedCredential>, CredentialError> {
        let Some(source) = CredentialSource::from_reference(reference)? else {
            if defaults.implicit_default {
                debug!("No credential source set, using implicit default");
                return Ok(None);
            }
            return Err(CredentialError::NoSource);
        };

        let identity_override = identity_override.filter(|identity| !identity.is_empty());
        let username_key = reference
            .username_key
            .as_deref()
            .unwrap_or(defaults.username_key);
        let password_key = reference
            .password_key
            .as_deref()
            .unwrap_or(defaults.password_key);

        debug!("Resolving credential from {}", source.as_str());
        let resolved = match &source {
            CredentialSource::LocalSecret { name } => {
                let location = format!("secret {}/{}", scope.namespace, name);
                let data = self
                    .clients
                    .store
                    .get_secret(scope.namespace, name)
                    .await?
                    .ok_or_else(|| CredentialError::NotFound {
                        what: location.clone(),
                    })?;
                let secret = secret_value(&data, password_key, &location)?;
                let identity = match identity_override {
                    Some(identity) => identity.to_string(),
                    None => secret_value(&data, username_key, &location)?,
                };
                ResolvedCredential::new(identity, secret)
            }
            CredentialSource::RemoteSecret { path } => {
                let location = format!("vault path {path}");
                let payload = self
                    .clients
                    .vault
                    .read(scope.session, path)
                    .await?
                    .map(unwrap_kv_data)
                    .ok_or_else(|| CredentialError::NotFound {
                        what: location.clone(),
                    })?;
                let secret = payload_value(&payload, password_key, &location)?;
                let identity = match identity_override {
                    Some(identity) => identity.to_string(),
                    None => payload_value(&payload, username_key, &location)?,
                };
                ResolvedCredential::new(identity, secret)
            }
            CredentialSource::GeneratedSecret { name } => {
                let random = self
                    .clients
                    .store
                    .get_random_secret(scope.namespace, name)
                    .await?
                    .ok_or_else(|| CredentialError::NotFound {
                        what: format!("RandomSecret {}/{}", scope.namespace, name),
                    })?;
                let path = random.read_path();
                let location = format!("vault path {path}");
                let identity = identity_override
                    .map(str::to_string)
                    .ok_or_else(|| CredentialError::MissingIdentity {
                        location: format!("RandomSecret {}/{}", scope.namespace, name),
                    })?;
                let payload = self
                    .clients
                    .vault
                    .read(scope.session, &path)
                    .await?
                    .map(unwrap_kv_data)
                    .ok_or_else(|| CredentialError::NotFound {
                        what: location.clone(),
                    })?;
                let key = reference
                    .password_key
                    .as_deref()
                    .unwrap_or(&random.spec.secret_key);
                let secret = payload_value(&payload, key, &location)?;
                ResolvedCredential::new(identity, secret)
            }
        };

        metrics::increment_credential_resolutions(source.as_str());
        Ok(Some(resolved))
    }
}

fn secret_value(data: &SecretData, key: &str, location: &str) -> Result<String, CredentialError> {
    let bytes = data.get(key).ok_or_else(|| CredentialError::KeyNotFound {
        key: key.to_string(),
        location: location.to_string(),
    })?;
    String::from_utf8(bytes.clone()).map_err(|_utf8| CredentialError::InvalidEncoding {
        key: key.to_string(),
        location: location.to_string(),
    })
}

fn payload_value(payload: &Payload, key: &str, location: &str) -> Result<String, CredentialError> {
    match payload.get(key) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(Value::Number(value)) => Ok(value.to_string()),
        Some(Value::Bool(value)) => Ok(value.to_string()),
        _ => Err(CredentialError::KeyNotFound {
            key: key.to_string(),
            location: location.to_string(),
        }),
    }
}
