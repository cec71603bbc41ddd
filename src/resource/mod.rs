//! # Vault Objects
//!
//! The contract every managed kind implements. The reconciliation engine is
//! generic over [`VaultObject`]: it asks the object for its Vault path, its
//! desired payload and how to compare that payload with what Vault returns,
//! and never needs to know which kind it is driving.

mod database;
pub mod equivalence;
mod ldap;
mod mount;
mod pki;
mod policy;
mod random_secret;

pub use equivalence::Comparison;
pub use pki::{generate_payload, sign_intermediate_payload, urls_payload};
pub use random_secret::refresh_due;

use crate::constants::FINALIZER;
use crate::controller::reconciler::ReconcileError;
use crate::credentials::{CredentialResolver, ResolveScope, ResolvedCredential};
use crate::crd::{KubeAuthConfiguration, VaultConnection, VaultObjectStatus};
use crate::validation::ValidationError;
use crate::vault::{Payload, VaultClient, VaultError, VaultSession};
use async_trait::async_trait;
use kube::Resource;
use std::collections::BTreeMap;
use vault_paths::errors::PathBuilderError;
use zeroize::Zeroizing;

/// Values computed during the prepare step of one pass
///
/// Holds resolved credentials and anything fetched or rendered from Vault.
/// Dropped (and zeroed) at the end of the pass.
#[derive(Default)]
pub struct InternalValues {
    pub credential: Option<ResolvedCredential>,
    /// Secret material produced by Vault for this pass, e.g. a generated password
    pub generated: Option<Zeroizing<String>>,
    /// Non-secret derived values keyed by payload field
    pub rendered: BTreeMap<String, String>,
}

impl std::fmt::Debug for InternalValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalValues")
            .field("credential", &self.credential)
            .field("generated", &self.generated.as_ref().map(|_| "<redacted>"))
            .field("rendered", &self.rendered)
            .finish()
    }
}

/// Everything the prepare step may use
pub struct PrepareContext<'a> {
    pub namespace: &'a str,
    pub session: &'a VaultSession,
    pub vault: &'a dyn VaultClient,
    pub resolver: &'a CredentialResolver,
}

impl PrepareContext<'_> {
    #[must_use]
    pub fn scope(&self) -> ResolveScope<'_> {
        ResolveScope {
            namespace: self.namespace,
            session: self.session,
        }
    }
}

/// A Kubernetes resource that owns exactly one piece of Vault configuration
#[async_trait]
pub trait VaultObject: Resource<DynamicType = ()> + Send + Sync {
    /// Per-resource connection override
    fn connection(&self) -> Option<&VaultConnection>;

    fn authentication(&self) -> &KubeAuthConfiguration;

    /// Canonical Vault path, or why one cannot be built
    ///
    /// # Errors
    ///
    /// [`PathBuilderError`] for empty paths or a missing name.
    fn vault_path(&self) -> Result<String, PathBuilderError>;

    /// Desired payload, built from the spec and the prepared values
    fn payload(&self, internal: &InternalValues) -> Payload;

    fn status(&self) -> Option<&VaultObjectStatus>;

    /// Canonical path; empty when [`VaultObject::vault_path`] fails, which validation rejects
    fn path(&self) -> String {
        self.vault_path().unwrap_or_default()
    }

    fn read_path(&self) -> String {
        self.path()
    }

    fn delete_path(&self) -> String {
        self.path()
    }

    /// `(path, body)` written when nothing exists yet
    fn create_request(&self, internal: &InternalValues) -> (String, Payload) {
        (self.path(), self.payload(internal))
    }

    /// `(path, body)` written when the observed state has drifted
    fn update_request(&self, internal: &InternalValues) -> (String, Payload) {
        self.create_request(internal)
    }

    /// The payload compared against what Vault returns
    fn desired_state(&self, internal: &InternalValues) -> Payload {
        self.payload(internal)
    }

    /// Keys Vault never returns, excluded from both sides of the comparison
    fn redacted_keys(&self) -> &'static [&'static str] {
        &[]
    }

    fn comparison(&self) -> Comparison {
        Comparison::Exact
    }

    /// Reshape a Vault read into the same form as [`VaultObject::desired_state`]
    fn normalize_observed(&self, observed: Payload) -> Payload {
        observed
    }

    fn is_equivalent_to_desired_state(&self, internal: &InternalValues, observed: &Payload) -> bool {
        equivalence::is_equivalent(
            &self.desired_state(internal),
            &self.normalize_observed(observed.clone()),
            self.redacted_keys(),
            self.comparison(),
        )
    }

    /// Whether removing the resource removes anything in Vault
    fn is_deletable(&self) -> bool {
        true
    }

    /// Structural validation; no remote calls
    ///
    /// # Errors
    ///
    /// [`ValidationError`] describing the first problem found.
    fn is_valid(&self) -> Result<(), ValidationError> {
        self.vault_path()?;
        Ok(())
    }

    /// The finalizer is in place
    fn is_initialized(&self) -> bool {
        self.meta()
            .finalizers
            .iter()
            .flatten()
            .any(|finalizer| finalizer == FINALIZER)
    }

    /// Whether a successful write is recorded in `status.lastVaultSecretUpdate`
    fn records_write_time(&self) -> bool {
        false
    }

    /// Resolve credentials and fetch derived values. Runs after login.
    async fn prepare_internal_values(
        &self,
        _ctx: &PrepareContext<'_>,
    ) -> Result<InternalValues, ReconcileError> {
        Ok(InternalValues::default())
    }

    /// Current state in Vault; `None` means nothing exists yet and a create follows
    ///
    /// # Errors
    ///
    /// Vault read failures other than "not found".
    async fn read_observed(&self, ctx: &PrepareContext<'_>) -> Result<Option<Payload>, VaultError> {
        ctx.vault.read(ctx.session, &self.read_path()).await
    }

    /// Fill in values only a write needs. Runs after the comparison, and only
    /// when a create or update follows.
    async fn prepare_write(
        &self,
        _ctx: &PrepareContext<'_>,
        _internal: &mut InternalValues,
    ) -> Result<(), ReconcileError> {
        Ok(())
    }

    fn kind_name(&self) -> String {
        Self::kind(&()).to_string()
    }
}

pub(crate) fn put_str(payload: &mut Payload, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        payload.insert(key.to_string(), value.into());
    }
}

pub(crate) fn put_list(payload: &mut Payload, key: &str, values: &[String]) {
    if !values.is_empty() {
        payload.insert(key.to_string(), values.into());
    }
}

/// Vault accepts several list-valued PKI fields as one comma-separated string
pub(crate) fn put_csv(payload: &mut Payload, key: &str, values: &[String]) {
    if !values.is_empty() {
        payload.insert(key.to_string(), values.join(",").into());
    }
}
