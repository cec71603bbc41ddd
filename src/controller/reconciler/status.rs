//! # Status
//!
//! Builds the status written after each pass and decides whether a watch
//! event can be skipped.

use super::engine::SyncOutcome;
use super::error::ReconcileError;
use crate::crd::{CaState, Condition, ReconcilePhase, VaultObjectStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;

pub const CONDITION_VALIDATED: &str = "Validated";
pub const CONDITION_READY: &str = "Ready";
pub const CONDITION_SIGNED: &str = "Signed";

pub const REASON_SYNCED: &str = "Synced";
pub const REASON_VALIDATED: &str = "Validated";

/// Tolerance for timer-driven passes that fire slightly early
const SCHEDULE_TOLERANCE_SECS: i64 = 2;

fn condition(condition_type: &str, ok: bool, reason: &str, message: String, now: DateTime<Utc>) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: if ok { "True" } else { "False" }.to_string(),
        last_transition_time: Some(now.to_rfc3339()),
        reason: Some(reason.to_string()),
        message: Some(message),
    }
}

/// Status after a pass, carrying forward what the pass did not touch
#[must_use]
pub fn next_status(
    previous: Option<&VaultObjectStatus>,
    generation: Option<i64>,
    result: &Result<SyncOutcome, ReconcileError>,
    records_write_time: bool,
    now: DateTime<Utc>,
    next_reconcile: DateTime<Utc>,
) -> VaultObjectStatus {
    let mut status = previous.cloned().unwrap_or_default();
    status.observed_generation = generation;
    status.last_reconcile_time = Some(now.to_rfc3339());
    status.next_reconcile_time = Some(next_reconcile.to_rfc3339());

    match result {
        Ok(outcome) => {
            status.phase = Some(ReconcilePhase::Synced);
            status.set_condition(condition(
                CONDITION_VALIDATED,
                true,
                REASON_VALIDATED,
                "Spec is valid".to_string(),
                now,
            ));
            status.set_condition(condition(
                CONDITION_READY,
                true,
                REASON_SYNCED,
                format!("Vault configuration in sync ({})", outcome.as_str()),
                now,
            ));
            if records_write_time && outcome.wrote() {
                status.last_vault_secret_update = Some(now.to_rfc3339());
            }
        }
        Err(error) => {
            let phase = error.phase();
            status.phase = Some(phase);
            if phase == ReconcilePhase::Unvalidated {
                status.set_condition(condition(
                    CONDITION_VALIDATED,
                    false,
                    error.reason(),
                    error.to_string(),
                    now,
                ));
            } else {
                status.set_condition(condition(
                    CONDITION_VALIDATED,
                    true,
                    REASON_VALIDATED,
                    "Spec is valid".to_string(),
                    now,
                ));
            }
            status.set_condition(condition(
                CONDITION_READY,
                false,
                error.reason(),
                error.to_string(),
                now,
            ));
        }
    }
    status
}

/// `Signed` condition for a CA in `state`
#[must_use]
pub fn signed_condition(state: CaState, now: DateTime<Utc>) -> Condition {
    let phase = state.phase().as_str();
    condition(
        CONDITION_SIGNED,
        state.is_signed(),
        phase,
        format!("CA is {phase}"),
        now,
    )
}

/// Status to record while a resource is being deleted
#[must_use]
pub fn deleting_status(
    previous: Option<&VaultObjectStatus>,
    error: &ReconcileError,
    now: DateTime<Utc>,
) -> VaultObjectStatus {
    let mut status = previous.cloned().unwrap_or_default();
    status.phase = Some(ReconcilePhase::Deleting);
    status.last_reconcile_time = Some(now.to_rfc3339());
    status.set_condition(condition(
        CONDITION_READY,
        false,
        error.reason(),
        format!("Deletion blocked: {error}"),
        now,
    ));
    status
}

/// Time left before the next scheduled pass, if this event can be skipped
///
/// A pass is skipped only when the spec has already been observed and the
/// recorded next reconcile time is still in the future.
#[must_use]
pub fn skip_remaining(
    generation: Option<i64>,
    status: Option<&VaultObjectStatus>,
    now: DateTime<Utc>,
) -> Option<Duration> {
    let status = status?;
    if generation.is_none() || status.observed_generation != generation {
        return None;
    }
    let next = status
        .next_reconcile_time
        .as_deref()
        .and_then(|time| DateTime::parse_from_rfc3339(time).ok())?
        .with_timezone(&Utc);
    let remaining = next - now;
    if remaining <= chrono::Duration::seconds(SCHEDULE_TOLERANCE_SECS) {
        return None;
    }
    remaining.to_std().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;
    use crate::vault::VaultError;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn ready(status: &VaultObjectStatus) -> &Condition {
        status.condition(CONDITION_READY).unwrap()
    }

    #[test]
    fn test_success_status() {
        let next = now() + chrono::Duration::minutes(5);
        let status = next_status(None, Some(3), &Ok(SyncOutcome::Created), true, now(), next);
        assert_eq!(status.phase, Some(ReconcilePhase::Synced));
        assert_eq!(status.observed_generation, Some(3));
        assert!(ready(&status).is_true());
        assert_eq!(ready(&status).reason.as_deref(), Some(REASON_SYNCED));
        assert_eq!(status.last_vault_secret_update, Some(now().to_rfc3339()));
        assert_eq!(status.next_reconcile_time, Some(next.to_rfc3339()));
    }

    #[test]
    fn test_unchanged_keeps_last_write_time() {
        let previous = VaultObjectStatus {
            last_vault_secret_update: Some("2026-01-01T00:00:00+00:00".to_string()),
            ..VaultObjectStatus::default()
        };
        let status = next_status(
            Some(&previous),
            Some(1),
            &Ok(SyncOutcome::Unchanged),
            true,
            now(),
            now(),
        );
        assert_eq!(
            status.last_vault_secret_update.as_deref(),
            Some("2026-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_validation_failure_status() {
        let error = ReconcileError::from(ValidationError::invalid("spec.policy", "must not be empty"));
        let status = next_status(None, Some(2), &Err(error), false, now(), now());
        assert_eq!(status.phase, Some(ReconcilePhase::Unvalidated));
        let validated = status.condition(CONDITION_VALIDATED).unwrap();
        assert!(!validated.is_true());
        assert_eq!(validated.reason.as_deref(), Some("ValidationFailed"));
        assert_eq!(ready(&status).reason.as_deref(), Some("ValidationFailed"));
    }

    #[test]
    fn test_remote_failure_status() {
        let error = ReconcileError::from(VaultError::PermissionDenied {
            path: "sys/mounts/kv".to_string(),
            message: "permission denied".to_string(),
        });
        let status = next_status(None, Some(2), &Err(error), false, now(), now());
        assert_eq!(status.phase, Some(ReconcilePhase::Prepared));
        assert!(status.condition(CONDITION_VALIDATED).unwrap().is_true());
        assert_eq!(ready(&status).reason.as_deref(), Some("RemoteError"));
    }

    #[test]
    fn test_signed_condition() {
        let condition = signed_condition(CaState::AwaitingSignature { exported: false }, now());
        assert!(!condition.is_true());
        assert_eq!(condition.reason.as_deref(), Some("AwaitingSignature"));
        assert!(signed_condition(CaState::Signed { exported: true }, now()).is_true());
    }

    #[test]
    fn test_skip_only_when_observed_and_scheduled_later() {
        let scheduled = VaultObjectStatus {
            observed_generation: Some(4),
            next_reconcile_time: Some((now() + chrono::Duration::minutes(5)).to_rfc3339()),
            ..VaultObjectStatus::default()
        };
        assert_eq!(
            skip_remaining(Some(4), Some(&scheduled), now()),
            Some(Duration::from_secs(300))
        );
        // spec changed
        assert_eq!(skip_remaining(Some(5), Some(&scheduled), now()), None);
        // schedule reached
        let later = now() + chrono::Duration::minutes(5);
        assert_eq!(skip_remaining(Some(4), Some(&scheduled), later), None);
        // never reconciled
        assert_eq!(skip_remaining(Some(4), None, now()), None);
    }
}
