//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `vault_config_reconciliations_total` - Reconciliation passes by kind
//! - `vault_config_reconciliation_errors_total` - Failed passes by kind and reason
//! - `vault_config_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `vault_config_sync_outcomes_total` - Created / updated / unchanged results by kind
//! - `vault_config_vault_operations_total` - Vault HTTP operations by operation
//! - `vault_config_vault_operation_duration_seconds` - Duration of Vault HTTP operations
//! - `vault_config_vault_operation_errors_total` - Failed Vault operations by operation and error
//! - `vault_config_credential_resolutions_total` - Resolved credentials by source
//! - `vault_config_pki_transitions_total` - PKI CA state transitions by target phase
//! - `vault_config_requeues_total` - Requeues by reason

use anyhow::Result;
use prometheus::{HistogramVec, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_config_reconciliations_total",
            "Total number of reconciliation passes by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_config_reconciliation_errors_total",
            "Total number of failed reconciliation passes by kind and reason",
        ),
        &["kind", "reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "vault_config_reconciliation_duration_seconds",
            "Duration of reconciliation passes in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static SYNC_OUTCOMES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_config_sync_outcomes_total",
            "Total number of sync outcomes by kind and outcome",
        ),
        &["kind", "outcome"],
    )
    .expect("Failed to create SYNC_OUTCOMES_TOTAL metric - this should never happen")
});

static VAULT_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_config_vault_operations_total",
            "Total number of Vault API operations by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create VAULT_OPERATIONS_TOTAL metric - this should never happen")
});

static VAULT_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "vault_config_vault_operation_duration_seconds",
            "Duration of Vault API operations in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create VAULT_OPERATION_DURATION metric - this should never happen")
});

static VAULT_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_config_vault_operation_errors_total",
            "Total number of failed Vault API operations by operation and error",
        ),
        &["operation", "error"],
    )
    .expect("Failed to create VAULT_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static CREDENTIAL_RESOLUTIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_config_credential_resolutions_total",
            "Total number of resolved credentials by source",
        ),
        &["source"],
    )
    .expect("Failed to create CREDENTIAL_RESOLUTIONS_TOTAL metric - this should never happen")
});

static PKI_TRANSITIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_config_pki_transitions_total",
            "Total number of PKI CA state transitions by target phase",
        ),
        &["phase"],
    )
    .expect("Failed to create PKI_TRANSITIONS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "vault_config_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only when a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(SYNC_OUTCOMES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(VAULT_OPERATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(CREDENTIAL_RESOLUTIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(PKI_TRANSITIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str, reason: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[kind, reason])
        .inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

pub fn increment_sync_outcome(kind: &str, outcome: &str) {
    SYNC_OUTCOMES_TOTAL.with_label_values(&[kind, outcome]).inc();
}

/// Record one completed Vault operation
pub fn observe_vault_operation(operation: &str, duration: f64) {
    VAULT_OPERATIONS_TOTAL.with_label_values(&[operation]).inc();
    VAULT_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_vault_operation_errors(operation: &str, error: &str) {
    VAULT_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation, error])
        .inc();
}

pub fn increment_credential_resolutions(source: &str) {
    CREDENTIAL_RESOLUTIONS_TOTAL
        .with_label_values(&[source])
        .inc();
}

pub fn increment_pki_transitions(phase: &str) {
    PKI_TRANSITIONS_TOTAL.with_label_values(&[phase]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_reconciliations() {
        let before = RECONCILIATIONS_TOTAL.with_label_values(&["Policy"]).get();
        increment_reconciliations("Policy");
        let after = RECONCILIATIONS_TOTAL.with_label_values(&["Policy"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_reconciliation_errors() {
        let before = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["RandomSecret", "RemoteError"])
            .get();
        increment_reconciliation_errors("RandomSecret", "RemoteError");
        let after = RECONCILIATION_ERRORS_TOTAL
            .with_label_values(&["RandomSecret", "RemoteError"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_observe_vault_operation() {
        let before = VAULT_OPERATIONS_TOTAL.with_label_values(&["read"]).get();
        observe_vault_operation("read", 0.02);
        let after = VAULT_OPERATIONS_TOTAL.with_label_values(&["read"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_credential_resolutions() {
        let before = CREDENTIAL_RESOLUTIONS_TOTAL
            .with_label_values(&["local_secret"])
            .get();
        increment_credential_resolutions("local_secret");
        let after = CREDENTIAL_RESOLUTIONS_TOTAL
            .with_label_values(&["local_secret"])
            .get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_increment_pki_transitions() {
        let before = PKI_TRANSITIONS_TOTAL.with_label_values(&["Signed"]).get();
        increment_pki_transitions("Signed");
        let after = PKI_TRANSITIONS_TOTAL.with_label_values(&["Signed"]).get();
        assert_eq!(after, before + 1u64);
    }

    #[test]
    fn test_observe_reconciliation_duration() {
        observe_reconciliation_duration("Policy", 0.4);
        // Just verify it doesn't panic
    }
}
