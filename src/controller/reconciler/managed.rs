//! # Managed Resources
//!
//! Glue between the kube watch loop and the engine. Every kind runs the
//! generic engine pass except `PkiSecretEngineConfig`, which runs the CA
//! lifecycle and records its progress alongside the common status.

use super::engine::{Engine, SyncOutcome};
use super::error::ReconcileError;
use super::status::{next_status, signed_condition};
use crate::controller::pki::{reconcile_pki, CaProgress};
use crate::crd::{
    AuthEngineMount, DatabaseSecretEngineConfig, LdapAuthEngineConfig, PkiSecretEngineConfig,
    PkiSecretEngineConfigStatus, Policy, RandomSecret, SecretEngineMount,
};
use crate::resource::VaultObject;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// How one pass ended
#[derive(Debug)]
pub struct PassOutcome {
    pub result: Result<SyncOutcome, ReconcileError>,
    /// CA progress, PKI only
    pub ca: Option<CaProgress>,
}

#[async_trait]
pub trait ManagedResource:
    VaultObject + Clone + Debug + DeserializeOwned + Serialize + 'static
{
    async fn sync(&self, engine: &Engine) -> PassOutcome {
        PassOutcome {
            result: engine.reconcile(self).await,
            ca: None,
        }
    }

    /// The `status` object to merge-patch after a pass
    ///
    /// # Errors
    ///
    /// Serialization failures.
    fn status_after(
        &self,
        outcome: &PassOutcome,
        now: DateTime<Utc>,
        next_reconcile: DateTime<Utc>,
    ) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(next_status(
            self.status(),
            self.meta().generation,
            &outcome.result,
            self.records_write_time(),
            now,
            next_reconcile,
        ))
    }
}

impl ManagedResource for Policy {}
impl ManagedResource for SecretEngineMount {}
impl ManagedResource for AuthEngineMount {}
impl ManagedResource for DatabaseSecretEngineConfig {}
impl ManagedResource for LdapAuthEngineConfig {}
impl ManagedResource for RandomSecret {}

#[async_trait]
impl ManagedResource for PkiSecretEngineConfig {
    async fn sync(&self, engine: &Engine) -> PassOutcome {
        let pass = reconcile_pki(engine, self).await;
        PassOutcome {
            result: pass.result,
            ca: Some(pass.progress),
        }
    }

    fn status_after(
        &self,
        outcome: &PassOutcome,
        now: DateTime<Utc>,
        next_reconcile: DateTime<Utc>,
    ) -> Result<serde_json::Value, serde_json::Error> {
        let progress = outcome.ca.unwrap_or_else(|| CaProgress::of(self));
        let mut common = next_status(
            self.status(),
            self.meta().generation,
            &outcome.result,
            false,
            now,
            next_reconcile,
        );
        common.set_condition(signed_condition(progress.state, now));
        serde_json::to_value(PkiSecretEngineConfigStatus {
            common,
            ca_state: progress.state,
            observed_type: progress.observed_type,
            observed_private_key_type: progress.observed_private_key_type,
        })
    }
}
