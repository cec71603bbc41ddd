//! # Reconcile Errors
//!
//! One taxonomy for every kind. The reason string ends up in the `Ready`
//! condition, the retry policy decides how the resource is requeued.

use crate::credentials::CredentialError;
use crate::crd::ReconcilePhase;
use crate::store::StoreError;
use crate::validation::ValidationError;
use crate::vault::VaultError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("credential resolution failed: {0}")]
    Credential(#[from] CredentialError),

    #[error("vault request failed: {0}")]
    Remote(#[from] VaultError),

    #[error("kubernetes store request failed: {0}")]
    Store(#[from] StoreError),

    #[error("kubernetes API request failed: {0}")]
    Kube(#[from] kube::Error),

    /// Waiting on something outside the operator, e.g. an externally signed certificate
    #[error("awaiting external input: {0}")]
    AwaitingExternalInput(String),
}

/// How a failed resource is requeued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Only a spec change can fix it
    AwaitSpecChange,
    /// Poll at the awaiting-input interval
    Poll,
    /// Fibonacci backoff
    Backoff,
}

impl ReconcileError {
    /// Condition reason
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::Validation(_) => "ValidationFailed",
            ReconcileError::Credential(e) if e.is_ambiguous() => "CredentialAmbiguous",
            ReconcileError::Credential(CredentialError::Vault(_)) => "RemoteError",
            ReconcileError::Credential(CredentialError::Store(_)) => "KubernetesError",
            ReconcileError::Credential(_) => "CredentialNotFound",
            ReconcileError::Remote(_) => "RemoteError",
            ReconcileError::Store(_) | ReconcileError::Kube(_) => "KubernetesError",
            ReconcileError::AwaitingExternalInput(_) => "AwaitingExternalInput",
        }
    }

    /// Phase a resource is left in after this error
    #[must_use]
    pub fn phase(&self) -> ReconcilePhase {
        if self.retry_policy() == RetryPolicy::AwaitSpecChange {
            ReconcilePhase::Unvalidated
        } else {
            ReconcilePhase::Prepared
        }
    }

    /// Whether the scheduler should try again without a spec change
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.retry_policy() != RetryPolicy::AwaitSpecChange
    }

    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            ReconcileError::Validation(_) => RetryPolicy::AwaitSpecChange,
            ReconcileError::Credential(e) if e.is_misconfigured() => RetryPolicy::AwaitSpecChange,
            ReconcileError::AwaitingExternalInput(_) => RetryPolicy::Poll,
            _ => RetryPolicy::Backoff,
        }
    }
}

/// A failed pass, as handed to the controller's error policy
#[derive(Debug, Error)]
#[error("{kind} {namespace}/{name}: {source}")]
pub struct ReconcilerError {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    #[source]
    pub source: ReconcileError,
    /// Delay chosen when the failure was recorded
    pub retry_after: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_waits_for_spec_change() {
        let error = ReconcileError::from(ValidationError::invalid("spec.path", "must not be empty"));
        assert_eq!(error.reason(), "ValidationFailed");
        assert_eq!(error.retry_policy(), RetryPolicy::AwaitSpecChange);
        assert_eq!(error.phase(), ReconcilePhase::Unvalidated);
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_credential_reasons() {
        let ambiguous = ReconcileError::from(CredentialError::Ambiguous {
            sources: vec!["secret", "vaultSecret"],
        });
        assert_eq!(ambiguous.reason(), "CredentialAmbiguous");
        assert_eq!(ambiguous.retry_policy(), RetryPolicy::AwaitSpecChange);

        let missing = ReconcileError::from(CredentialError::NotFound {
            what: "secret team-a/db-root".to_string(),
        });
        assert_eq!(missing.reason(), "CredentialNotFound");
        assert_eq!(missing.retry_policy(), RetryPolicy::Backoff);
        assert_eq!(missing.phase(), ReconcilePhase::Prepared);
    }

    #[test]
    fn test_remote_errors_back_off() {
        let error = ReconcileError::from(VaultError::Unavailable {
            status: 503,
            path: "sys/mounts/kv".to_string(),
            message: "sealed".to_string(),
        });
        assert_eq!(error.reason(), "RemoteError");
        assert_eq!(error.retry_policy(), RetryPolicy::Backoff);
    }

    #[test]
    fn test_awaiting_input_polls() {
        let error = ReconcileError::AwaitingExternalInput("signed certificate".to_string());
        assert_eq!(error.reason(), "AwaitingExternalInput");
        assert_eq!(error.retry_policy(), RetryPolicy::Poll);
    }
}
