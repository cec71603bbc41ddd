//! Generated secrets written to a key/value engine
//!
//! The value comes from a Vault password policy. Once written it is left
//! alone until `refreshPeriod` has elapsed since the last write, and the
//! policy is only asked for a new value when a write is about to happen.

use super::{InternalValues, PrepareContext, VaultObject};
use crate::controller::reconciler::ReconcileError;
use crate::crd::{KubeAuthConfiguration, RandomSecret, VaultConnection, VaultObjectStatus};
use crate::validation::{parse_kubernetes_duration, require_non_empty, validate_optional_duration, ValidationError};
use crate::vault::{string_field, unwrap_kv_data, wrap_kv_data, Payload};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kube::ResourceExt;
use vault_paths::builder::VaultPath;
use vault_paths::clean::effective_name;
use vault_paths::errors::PathBuilderError;
use vault_paths::operations::{kv_metadata_path, kv_path, password_policy_generate};
use zeroize::Zeroizing;

/// Whether a refresh is due at `now`
///
/// Without a refresh period the value never rotates. Without a recorded
/// write time (or an unparsable one) a refresh is due.
#[must_use]
pub fn refresh_due(refresh_period: Option<&str>, last_update: Option<&str>, now: DateTime<Utc>) -> bool {
    let Some(period) = refresh_period.and_then(|period| parse_kubernetes_duration(period).ok()) else {
        return false;
    };
    let Some(last_update) = last_update.and_then(|time| DateTime::parse_from_rfc3339(time).ok()) else {
        return true;
    };
    match chrono::Duration::from_std(period) {
        Ok(period) => now >= last_update.with_timezone(&Utc) + period,
        Err(_) => false,
    }
}

impl RandomSecret {
    fn secret_name(&self) -> String {
        effective_name(self.spec.name.as_deref(), &self.name_any()).to_string()
    }

    fn last_update(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|status| status.last_vault_secret_update.as_deref())
    }
}

#[async_trait]
impl VaultObject for RandomSecret {
    fn connection(&self) -> Option<&VaultConnection> {
        self.spec.connection.as_ref()
    }

    fn authentication(&self) -> &KubeAuthConfiguration {
        &self.spec.authentication
    }

    fn vault_path(&self) -> Result<String, PathBuilderError> {
        VaultPath::new()
            .segment(kv_path(&self.spec.path, "", self.spec.kv_secret_engine_v2))
            .name(self.spec.name.as_deref(), &self.name_any())
            .require_name()
            .build()
    }

    fn payload(&self, internal: &InternalValues) -> Payload {
        let mut payload = Payload::new();
        if let Some(generated) = &internal.generated {
            payload.insert(self.spec.secret_key.clone(), generated.as_str().into());
        }
        payload
    }

    fn status(&self) -> Option<&VaultObjectStatus> {
        self.status.as_ref()
    }

    fn read_path(&self) -> String {
        kv_path(
            &self.spec.path,
            &self.secret_name(),
            self.spec.kv_secret_engine_v2,
        )
    }

    /// Version 2 secrets are removed with all their versions
    fn delete_path(&self) -> String {
        if self.spec.kv_secret_engine_v2 {
            kv_metadata_path(&self.spec.path, &self.secret_name())
        } else {
            self.read_path()
        }
    }

    fn create_request(&self, internal: &InternalValues) -> (String, Payload) {
        let payload = self.payload(internal);
        if self.spec.kv_secret_engine_v2 {
            (self.read_path(), wrap_kv_data(payload))
        } else {
            (self.read_path(), payload)
        }
    }

    fn normalize_observed(&self, observed: Payload) -> Payload {
        unwrap_kv_data(observed)
    }

    /// Present and not yet due for refresh. The value itself is never compared.
    fn is_equivalent_to_desired_state(&self, _internal: &InternalValues, observed: &Payload) -> bool {
        let observed = self.normalize_observed(observed.clone());
        let present = string_field(&observed, &self.spec.secret_key).is_some_and(|value| !value.is_empty());
        present && !refresh_due(self.spec.refresh_period.as_deref(), self.last_update(), Utc::now())
    }

    fn is_valid(&self) -> Result<(), ValidationError> {
        self.vault_path()?;
        require_non_empty("spec.path", &self.spec.path)?;
        require_non_empty("spec.secretKey", &self.spec.secret_key)?;
        require_non_empty(
            "spec.secretFormat.passwordPolicyName",
            &self.spec.secret_format.password_policy_name,
        )?;
        validate_optional_duration("spec.refreshPeriod", self.spec.refresh_period.as_deref())
    }

    fn records_write_time(&self) -> bool {
        true
    }

    async fn prepare_write(
        &self,
        ctx: &PrepareContext<'_>,
        internal: &mut InternalValues,
    ) -> Result<(), ReconcileError> {
        let policy = &self.spec.secret_format.password_policy_name;
        let generated = ctx
            .vault
            .read(ctx.session, &password_policy_generate(policy))
            .await?
            .and_then(|payload| string_field(&payload, "password").map(|password| Zeroizing::new(password.to_string())))
            .ok_or_else(|| {
                ReconcileError::AwaitingExternalInput(format!(
                    "password policy '{policy}' returned no password"
                ))
            })?;
        internal.generated = Some(generated);
        Ok(())
    }
}
