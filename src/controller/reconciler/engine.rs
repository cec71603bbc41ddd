//! # Reconciliation Engine
//!
//! Drives one [`VaultObject`] through a pass:
//!
//! 1. Validate the spec (no remote calls)
//! 2. Log in to Vault with the resource's Kubernetes auth settings
//! 3. Prepare internal values (credentials, rendered fields)
//! 4. Read the current state and write only if it differs; values needed
//!    only for a write are fetched at this point
//!
//! The engine is kind-agnostic and holds no per-resource state, so passes for
//! different resources can run concurrently.

use super::error::ReconcileError;
use crate::clients::Clients;
use crate::config::VaultDefaults;
use crate::constants::TLS_CA_KEY;
use crate::credentials::{CredentialError, CredentialResolver};
use crate::crd::{KubeAuthConfiguration, VaultConnection};
use crate::resource::{equivalence, Comparison, PrepareContext, VaultObject};
use crate::vault::{LoginRequest, Payload, VaultError, VaultSession, VaultTarget};
use kube::ResourceExt;
use tracing::{debug, info, Instrument};

/// What a sync did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created,
    Updated,
    Unchanged,
}

impl SyncOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SyncOutcome::Created => "created",
            SyncOutcome::Updated => "updated",
            SyncOutcome::Unchanged => "unchanged",
        }
    }

    #[must_use]
    pub fn wrote(self) -> bool {
        !matches!(self, SyncOutcome::Unchanged)
    }
}

/// What a delete did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
    /// The kind owns nothing removable in Vault
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Engine {
    clients: Clients,
    resolver: CredentialResolver,
    defaults: VaultDefaults,
    token_ttl_secs: i64,
}

impl Engine {
    #[must_use]
    pub fn new(clients: Clients, defaults: VaultDefaults, token_ttl_secs: i64) -> Self {
        let resolver = CredentialResolver::new(clients.clone());
        Self {
            clients,
            resolver,
            defaults,
            token_ttl_secs,
        }
    }

    #[must_use]
    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Merge the per-resource connection override with the operator defaults
    ///
    /// # Errors
    ///
    /// Fails if the CA bundle cannot be loaded.
    pub async fn target(
        &self,
        namespace: &str,
        connection: Option<&VaultConnection>,
    ) -> Result<VaultTarget, ReconcileError> {
        let address = connection
            .and_then(|c| c.address.clone())
            .unwrap_or_else(|| self.defaults.address.clone());
        let vault_namespace = connection
            .and_then(|c| c.namespace.clone())
            .or_else(|| self.defaults.namespace.clone());
        let tls = connection.and_then(|c| c.tls.as_ref());
        let skip_verify = tls.is_some_and(|tls| tls.skip_verify) || self.defaults.skip_verify;

        let ca_pem = match tls.and_then(|tls| tls.ca_secret.as_deref()) {
            Some(secret) => {
                let location = format!("secret {namespace}/{secret}");
                let data = self
                    .clients
                    .store
                    .get_secret(namespace, secret)
                    .await?
                    .ok_or_else(|| CredentialError::NotFound {
                        what: location.clone(),
                    })?;
                let bytes = data.get(TLS_CA_KEY).ok_or_else(|| CredentialError::KeyNotFound {
                    key: TLS_CA_KEY.to_string(),
                    location: location.clone(),
                })?;
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
            None => match &self.defaults.ca_cert_file {
                Some(path) => Some(tokio::fs::read_to_string(path).await.map_err(|e| {
                    VaultError::InvalidTarget(format!("cannot read CA bundle {path}: {e}"))
                })?),
                None => None,
            },
        };

        Ok(VaultTarget {
            address,
            namespace: vault_namespace,
            ca_pem,
            skip_verify,
        })
    }

    /// Exchange a fresh service account token for a Vault session
    ///
    /// # Errors
    ///
    /// Token request or Vault login failures.
    pub async fn login(
        &self,
        namespace: &str,
        connection: Option<&VaultConnection>,
        auth: &KubeAuthConfiguration,
    ) -> Result<VaultSession, ReconcileError> {
        let target = self.target(namespace, connection).await?;
        let jwt = self
            .clients
            .store
            .service_account_token(
                namespace,
                &auth.service_account.name,
                &auth.audiences,
                self.token_ttl_secs,
            )
            .await?;
        let request = LoginRequest {
            mount: auth.path.clone(),
            role: auth.role.clone(),
            jwt,
            namespace: auth.namespace.clone(),
        };
        debug!(
            "Logging in to {} as role '{}' via auth/{}",
            target.address, request.role, request.mount
        );
        Ok(self.clients.vault.login(&target, &request).await?)
    }

    /// Run one pass for `object`
    ///
    /// # Errors
    ///
    /// Any [`ReconcileError`]; validation failures happen before any remote call.
    pub async fn reconcile<O: VaultObject>(&self, object: &O) -> Result<SyncOutcome, ReconcileError> {
        let namespace = object.namespace().unwrap_or_default();
        let kind = object.kind_name();
        let span = tracing::info_span!(
            "engine.reconcile",
            resource.kind = kind.as_str(),
            resource.name = object.name_any().as_str(),
            resource.namespace = namespace.as_str()
        );

        let result: Result<SyncOutcome, ReconcileError> = async {
            object.is_valid()?;

            let session = self
                .login(&namespace, object.connection(), object.authentication())
                .await?;
            let ctx = PrepareContext {
                namespace: &namespace,
                session: &session,
                vault: self.clients.vault.as_ref(),
                resolver: &self.resolver,
            };
            let mut internal = object.prepare_internal_values(&ctx).await?;

            let observed = object.read_observed(&ctx).await?;
            let outcome = match observed {
                None => {
                    object.prepare_write(&ctx, &mut internal).await?;
                    let (path, body) = object.create_request(&internal);
                    self.clients.vault.write(&session, &path, &body).await?;
                    SyncOutcome::Created
                }
                Some(observed) if object.is_equivalent_to_desired_state(&internal, &observed) => {
                    SyncOutcome::Unchanged
                }
                Some(_) => {
                    object.prepare_write(&ctx, &mut internal).await?;
                    let (path, body) = object.update_request(&internal);
                    self.clients.vault.write(&session, &path, &body).await?;
                    SyncOutcome::Updated
                }
            };

            if outcome.wrote() {
                info!("✅ {} {} at {}", kind, outcome.as_str(), object.path());
            } else {
                debug!("{} at {} already matches desired state", kind, object.path());
            }
            Ok(outcome)
        }
        .instrument(span)
        .await;
        result
    }

    /// Sync a plain payload at `path` within an existing session
    ///
    /// # Errors
    ///
    /// Vault read or write failures.
    pub async fn sync_path(
        &self,
        session: &VaultSession,
        path: &str,
        desired: &Payload,
        comparison: Comparison,
    ) -> Result<SyncOutcome, ReconcileError> {
        let vault = &self.clients.vault;
        match vault.read(session, path).await? {
            Some(observed) if equivalence::is_equivalent(desired, &observed, &[], comparison) => {
                Ok(SyncOutcome::Unchanged)
            }
            observed => {
                vault.write(session, path, desired).await?;
                Ok(if observed.is_some() {
                    SyncOutcome::Updated
                } else {
                    SyncOutcome::Created
                })
            }
        }
    }

    /// Remove what `object` manages in Vault
    ///
    /// # Errors
    ///
    /// Login or delete failures other than "already gone".
    pub async fn delete<O: VaultObject>(&self, object: &O) -> Result<DeleteOutcome, ReconcileError> {
        if !object.is_deletable() {
            return Ok(DeleteOutcome::Skipped);
        }
        let namespace = object.namespace().unwrap_or_default();
        let session = self
            .login(&namespace, object.connection(), object.authentication())
            .await?;
        let path = object.delete_path();
        match self.clients.vault.delete(&session, &path).await {
            Ok(()) => {
                info!("🗑️  Deleted {} at {}", object.kind_name(), path);
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) if e.is_not_found() => {
                debug!("{} already absent at {}", object.kind_name(), path);
                Ok(DeleteOutcome::AlreadyAbsent)
            }
            Err(e) => Err(e.into()),
        }
    }
}
