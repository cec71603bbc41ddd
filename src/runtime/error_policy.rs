//! # Error Policy
//!
//! Requeue decisions for failed passes and classification of watch stream
//! errors. The retry delay itself is chosen in the pass, where the error's
//! retry policy and the per-resource backoff are known.

use crate::controller::reconciler::{ManagedResource, Reconciler, ReconcilerError, RetryPolicy};
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Requeue a failed pass after the delay it recorded
pub fn error_policy<K: ManagedResource>(
    obj: Arc<K>,
    error: &ReconcilerError,
    _ctx: Arc<Reconciler>,
) -> Action {
    let reason = error.source.reason();
    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.reconciliation_error",
        resource.kind = error.kind.as_str(),
        resource.name = obj.name_any().as_str(),
        resource.namespace = error.namespace.as_str(),
        error.reason = reason
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error: {}", error);
    metrics::increment_reconciliation_errors(&error.kind, reason);

    let requeue_reason = match error.source.retry_policy() {
        RetryPolicy::AwaitSpecChange => {
            info!(
                "✋ Waiting for a spec change (safety requeue in {}s)",
                error.retry_after.as_secs()
            );
            "validation"
        }
        RetryPolicy::Poll => "awaiting-input",
        RetryPolicy::Backoff => {
            let next = chrono::Utc::now()
                + chrono::Duration::from_std(error.retry_after).unwrap_or_default();
            info!(
                "🔄 Retrying with Fibonacci backoff: {}s, next attempt {}",
                error.retry_after.as_secs(),
                next.to_rfc3339()
            );
            "error-backoff"
        }
    };
    metrics::increment_requeues_total(requeue_reason);
    Action::requeue(error.retry_after)
}

/// Broad class of a watch stream failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorClass {
    /// 401: RBAC revoked or token expired
    Unauthorized,
    /// 410: resource version too old, normal after restarts
    Expired,
    /// 429: API server storage reinitializing
    Throttled,
    /// 404: CRD missing or object deleted
    NotFound,
    Other,
}

/// Classify a watch error from its debug rendering
///
/// 404 is checked before 401 since a plain-text 404 body surfaces as a
/// decode error that also mentions the failed watch.
#[must_use]
pub fn classify_watch_error(error: &str) -> WatchErrorClass {
    let is_not_found =
        error.contains("ObjectNotFound") || error.contains("404") || error.contains("not found");
    if is_not_found {
        WatchErrorClass::NotFound
    } else if error.contains("401") || error.contains("Unauthorized") {
        WatchErrorClass::Unauthorized
    } else if error.contains("410")
        || error.contains("too old resource version")
        || error.contains("Expired")
        || error.contains("Gone")
    {
        WatchErrorClass::Expired
    } else if error.contains("429")
        || error.contains("storage is (re)initializing")
        || error.contains("TooManyRequests")
    {
        WatchErrorClass::Throttled
    } else {
        WatchErrorClass::Other
    }
}

/// Log a watch stream error; `true` when the watch should pause before resuming
fn log_watch_error(kind: &str, error: &str) -> bool {
    let error_span = tracing::span!(tracing::Level::WARN, "controller.watch.error", resource.kind = kind);
    let _guard = error_span.enter();
    match classify_watch_error(error) {
        WatchErrorClass::Unauthorized => {
            error!(
                "❌ {} watch failed with 401 Unauthorized; check the operator's ClusterRole and ServiceAccount",
                kind
            );
            true
        }
        WatchErrorClass::Expired => {
            warn!("{} watch resource version expired (410), watch will resume", kind);
            false
        }
        WatchErrorClass::Throttled => {
            warn!("API server busy (429) while watching {}, backing off", kind);
            true
        }
        WatchErrorClass::NotFound => {
            warn!("{} not found (404); is the CRD installed? {}", kind, error);
            false
        }
        WatchErrorClass::Other => {
            error!("{} controller stream error: {}", kind, error);
            true
        }
    }
}

/// Log a watch stream error and pause when retrying immediately would not help
pub async fn handle_watch_stream_error(kind: &str, error: &str, restart_delay: Duration) {
    if log_watch_error(kind, error) {
        tokio::time::sleep(restart_delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_watch_error() {
        assert_eq!(
            classify_watch_error("WatchFailed(Api(ErrorResponse { code: 401, reason: \"Unauthorized\" }))"),
            WatchErrorClass::Unauthorized
        );
        assert_eq!(
            classify_watch_error("too old resource version: 123 (456)"),
            WatchErrorClass::Expired
        );
        assert_eq!(
            classify_watch_error("storage is (re)initializing"),
            WatchErrorClass::Throttled
        );
        assert_eq!(
            classify_watch_error("WatchFailed(SerdeError(invalid type: integer `404`))"),
            WatchErrorClass::NotFound
        );
        assert_eq!(classify_watch_error("connection reset"), WatchErrorClass::Other);
    }
}
