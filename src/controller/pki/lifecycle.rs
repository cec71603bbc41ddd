//! CA lifecycle pass
//!
//! Unlike the generic kinds, a CA is not a single read/compare/write: it is a
//! sequence of one-shot calls whose results must be remembered. The pass
//! advances [`CaProgress`] step by step and hands whatever it reached back to
//! the caller even when a later step fails, so status always reflects what
//! Vault actually holds.

use super::export::{export_secret, export_secret_name};
use crate::constants::DEFAULT_SIGNED_CERT_KEY;
use crate::controller::reconciler::{Engine, ReconcileError, SyncOutcome};
use crate::credentials::CredentialError;
use crate::crd::{
    CaState, ExternalSignSecret, PkiCaType, PkiReference, PkiSecretEngineConfig, PrivateKeyType,
};
use crate::observability::metrics;
use crate::resource::{generate_payload, sign_intermediate_payload, urls_payload, Comparison, VaultObject};
use crate::store::StoreError;
use crate::validation::ValidationError;
use crate::vault::{string_field, Payload, VaultSession};
use kube::ResourceExt;
use tracing::{debug, info, warn, Instrument};
use vault_paths::operations::PkiOperation;

/// CA fields recorded in status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaProgress {
    pub state: CaState,
    pub observed_type: Option<PkiCaType>,
    pub observed_private_key_type: Option<PrivateKeyType>,
}

impl CaProgress {
    #[must_use]
    pub fn of(pki: &PkiSecretEngineConfig) -> Self {
        let status = pki.status.as_ref();
        Self {
            state: pki.ca_state(),
            observed_type: status.and_then(|s| s.observed_type),
            observed_private_key_type: status.and_then(|s| s.observed_private_key_type),
        }
    }
}

/// Result of one CA pass: how far it got, and how it ended
#[derive(Debug)]
pub struct PkiPass {
    pub progress: CaProgress,
    pub result: Result<SyncOutcome, ReconcileError>,
}

/// Run one lifecycle pass for `pki`
pub async fn reconcile_pki(engine: &Engine, pki: &PkiSecretEngineConfig) -> PkiPass {
    let span = tracing::info_span!(
        "pki.reconcile",
        resource.name = pki.name_any().as_str(),
        resource.namespace = pki.namespace().unwrap_or_default().as_str()
    );
    let mut progress = CaProgress::of(pki);
    let result = Lifecycle { engine, pki }
        .run(&mut progress)
        .instrument(span)
        .await;
    PkiPass { progress, result }
}

struct Lifecycle<'a> {
    engine: &'a Engine,
    pki: &'a PkiSecretEngineConfig,
}

impl Lifecycle<'_> {
    fn namespace(&self) -> String {
        self.pki.namespace().unwrap_or_default()
    }

    fn transition(&self, progress: &mut CaProgress, next: CaState) {
        if progress.state == next {
            return;
        }
        info!(
            "🔐 CA {}: {} -> {}",
            self.pki.name_any(),
            progress.state.phase().as_str(),
            next.phase().as_str()
        );
        metrics::increment_pki_transitions(next.phase().as_str());
        progress.state = next;
    }

    async fn run(&self, progress: &mut CaProgress) -> Result<SyncOutcome, ReconcileError> {
        self.pki.is_valid()?;
        let namespace = self.namespace();
        let session = self
            .engine
            .login(&namespace, self.pki.connection(), self.pki.authentication())
            .await?;
        let mount = self.pki.path();
        let spec = &self.pki.spec;

        let mut outcome = SyncOutcome::Unchanged;
        // The CSR only exists in memory during the pass that generated it
        let mut fresh_csr: Option<String> = None;

        if !progress.state.is_generated() {
            let exported = spec.private_key_type == PrivateKeyType::Exported;
            let path = PkiOperation::Generate(spec.ca_type.into(), spec.private_key_type.into())
                .path(&mount);
            let response = self
                .engine
                .clients()
                .vault
                .write(&session, &path, &generate_payload(spec))
                .await?
                .unwrap_or_default();

            if exported || spec.ca_type == PkiCaType::Intermediate {
                self.persist_artifacts(&response).await?;
            }
            fresh_csr = string_field(&response, "csr").map(str::to_string);

            progress.observed_type = Some(spec.ca_type);
            progress.observed_private_key_type = Some(spec.private_key_type);
            self.transition(progress, CaState::generated(exported));
            outcome = SyncOutcome::Created;
        }

        if !progress.state.is_signed() {
            match spec.ca_type {
                PkiCaType::Root => self.transition(progress, progress.state.signed()),
                PkiCaType::Intermediate => {
                    self.transition(progress, progress.state.awaiting_signature());
                    let certificate = match (&spec.internal_sign, &spec.external_sign_secret) {
                        (Some(signer), _) => {
                            let csr = self.csr(progress, fresh_csr.take()).await?;
                            self.sign_internally(signer, &csr).await?
                        }
                        (None, Some(secret)) => self.external_certificate(secret).await?,
                        (None, None) => {
                            return Err(ValidationError::invalid(
                                "spec.type",
                                "an intermediate CA needs exactly one of internalSign or externalSignSecret",
                            )
                            .into())
                        }
                    };
                    let mut body = Payload::new();
                    body.insert("certificate".to_string(), certificate.into());
                    self.engine
                        .clients()
                        .vault
                        .write(&session, &PkiOperation::SetSigned.path(&mount), &body)
                        .await?;
                    self.transition(progress, progress.state.signed());
                    outcome = most_significant(SyncOutcome::Updated, outcome);
                }
            }
        }

        if let Some(urls) = urls_payload(spec) {
            let path = PkiOperation::ConfigUrls.path(&mount);
            let urls_outcome = self
                .engine
                .sync_path(&session, &path, &urls, Comparison::DesiredKeys)
                .await?;
            outcome = most_significant(urls_outcome, outcome);
        }

        Ok(outcome)
    }

    /// Write the companion secret, replacing a leftover from an earlier attempt
    async fn persist_artifacts(&self, response: &Payload) -> Result<(), ReconcileError> {
        let store = &self.engine.clients().store;
        let secret = export_secret(self.pki, response);
        match store.create_secret(secret.clone()).await {
            Ok(()) => {}
            Err(StoreError::AlreadyExists { namespace, name, .. }) => {
                // immutable, so replace rather than update
                warn!("Replacing stale CA export secret {}/{}", namespace, name);
                store.delete_secret(&namespace, &name).await?;
                store.create_secret(secret).await?;
            }
            Err(e) => return Err(e.into()),
        }
        info!(
            "💾 Stored CA material for {} in secret {}",
            self.pki.name_any(),
            export_secret_name(self.pki)
        );
        Ok(())
    }

    /// CSR from this pass, or from the companion secret when resuming
    async fn csr(&self, progress: &mut CaProgress, fresh: Option<String>) -> Result<String, ReconcileError> {
        if let Some(csr) = fresh {
            return Ok(csr);
        }
        let namespace = self.namespace();
        let name = export_secret_name(self.pki);
        let stored = self
            .engine
            .clients()
            .store
            .get_secret(&namespace, &name)
            .await?
            .and_then(|data| data.get("csr").cloned())
            .and_then(|bytes| String::from_utf8(bytes).ok());
        match stored {
            Some(csr) => Ok(csr),
            None => {
                // Nothing left to sign; generate again on the next pass
                warn!(
                    "CSR for {} is gone, resetting CA to NotGenerated",
                    self.pki.name_any()
                );
                self.transition(progress, CaState::NotGenerated);
                Err(CredentialError::NotFound {
                    what: format!("CSR in secret {namespace}/{name}"),
                }
                .into())
            }
        }
    }

    async fn sign_internally(&self, signer_ref: &PkiReference, csr: &str) -> Result<String, ReconcileError> {
        let signer_namespace = signer_ref.namespace.clone().unwrap_or_else(|| self.namespace());
        let clients = self.engine.clients();
        let signer = clients
            .store
            .get_pki_config(&signer_namespace, &signer_ref.name)
            .await?
            .ok_or_else(|| {
                ReconcileError::AwaitingExternalInput(format!(
                    "signing CA {signer_namespace}/{} does not exist",
                    signer_ref.name
                ))
            })?;

        if signer.spec.ca_type != PkiCaType::Root {
            return Err(ValidationError::invalid(
                "spec.internalSign",
                format!("{signer_namespace}/{} is not a root CA", signer_ref.name),
            )
            .into());
        }
        if !signer.ca_state().is_signed() {
            return Err(ReconcileError::AwaitingExternalInput(format!(
                "signing CA {signer_namespace}/{} is not ready",
                signer_ref.name
            )));
        }

        let signer_session: VaultSession = self
            .engine
            .login(&signer_namespace, signer.connection(), signer.authentication())
            .await?;
        let path = PkiOperation::SignIntermediate.path(&signer.path());
        debug!("Signing intermediate {} via {}", self.pki.name_any(), path);
        let response = clients
            .vault
            .write(&signer_session, &path, &sign_intermediate_payload(&self.pki.spec, csr))
            .await?
            .unwrap_or_default();

        let certificate = string_field(&response, "certificate").ok_or_else(|| {
            crate::vault::VaultError::Decode {
                path: path.clone(),
                message: "sign-intermediate returned no certificate".to_string(),
            }
        })?;
        Ok(match string_field(&response, "issuing_ca") {
            Some(issuing_ca) if !issuing_ca.is_empty() => format!("{certificate}\n{issuing_ca}"),
            _ => certificate.to_string(),
        })
    }

    async fn external_certificate(&self, secret: &ExternalSignSecret) -> Result<String, ReconcileError> {
        let namespace = self.namespace();
        let key = if secret.key.is_empty() {
            DEFAULT_SIGNED_CERT_KEY
        } else {
            secret.key.as_str()
        };
        let certificate = self
            .engine
            .clients()
            .store
            .get_secret(&namespace, &secret.name)
            .await?
            .and_then(|data| data.get(key).cloned())
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .filter(|certificate| !certificate.trim().is_empty());
        certificate.ok_or_else(|| {
            ReconcileError::AwaitingExternalInput(format!(
                "signed certificate in secret {namespace}/{} key '{key}'",
                secret.name
            ))
        })
    }
}

/// created > updated > unchanged
fn most_significant(a: SyncOutcome, b: SyncOutcome) -> SyncOutcome {
    match (a, b) {
        (SyncOutcome::Created, _) | (_, SyncOutcome::Created) => SyncOutcome::Created,
        (SyncOutcome::Updated, _) | (_, SyncOutcome::Updated) => SyncOutcome::Updated,
        _ => SyncOutcome::Unchanged,
    }
}
