//! # Watch Loop
//!
//! One kube-runtime controller per kind. Every kind shares the same pass:
//!
//! 1. Deleting: clean up Vault, then release the finalizer
//! 2. No finalizer yet: add it and stop (the patch re-triggers the watch)
//! 3. Spec already observed and next pass not yet due: skip
//! 4. Sync through the engine (or the CA lifecycle) and patch status

use crate::config::ControllerConfig;
use crate::controller::reconciler::finalizer::{add_finalizer, patch_status, remove_finalizer};
use crate::controller::reconciler::status::{deleting_status, skip_remaining};
use crate::controller::reconciler::{
    ManagedResource, PassOutcome, ReconcileError, Reconciler, ReconcilerError, RetryPolicy,
};
use crate::controller::server::ServerState;
use crate::crd::{
    AuthEngineMount, DatabaseSecretEngineConfig, LdapAuthEngineConfig, PkiSecretEngineConfig,
    Policy, RandomSecret, SecretEngineMount,
};
use crate::observability::metrics;
use crate::runtime::error_policy::{error_policy, handle_watch_stream_error};
use futures::StreamExt;
use k8s_openapi::NamespaceResourceScope;
use kube::api::Api;
use kube::{Client, Resource, ResourceExt};
use kube_runtime::controller::{self, Action};
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Instrument};

/// `kind/namespace/name`, the key for per-resource backoff
#[must_use]
pub fn resource_key(kind: &str, namespace: &str, name: &str) -> String {
    format!("{kind}/{namespace}/{name}")
}

/// Delay before the next pass after a failure, by retry policy
fn failure_delay(ctx: &Reconciler, key: &str, error: &ReconcileError) -> Duration {
    match error.retry_policy() {
        RetryPolicy::AwaitSpecChange => ctx.config.validation_requeue(),
        RetryPolicy::Poll => ctx.config.awaiting_input_requeue(),
        RetryPolicy::Backoff => ctx.next_backoff(key),
    }
}

fn schedule_after(delay: Duration) -> chrono::DateTime<chrono::Utc> {
    let now = chrono::Utc::now();
    chrono::Duration::from_std(delay).map_or(now, |delay| now + delay)
}

/// One reconciliation pass for any managed kind
///
/// # Errors
///
/// A [`ReconcilerError`] carrying the delay chosen for the retry.
pub async fn reconcile<K>(obj: Arc<K>, ctx: Arc<Reconciler>) -> Result<Action, ReconcilerError>
where
    K: ManagedResource + Resource<Scope = NamespaceResourceScope>,
{
    let kind = obj.kind_name();
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();
    let key = resource_key(&kind, &namespace, &name);
    let api: Api<K> = Api::namespaced(ctx.client.clone(), &namespace);

    let fail = |source: ReconcileError, retry_after: Duration| ReconcilerError {
        kind: kind.clone(),
        namespace: namespace.clone(),
        name: name.clone(),
        source,
        retry_after,
    };

    if obj.meta().deletion_timestamp.is_some() {
        if !obj.is_initialized() {
            return Ok(Action::await_change());
        }
        info!("🗑️  {} {}/{} is being deleted", kind, namespace, name);
        return match ctx.engine.delete(obj.as_ref()).await {
            Ok(outcome) => {
                debug!("Cleanup of {} finished: {:?}", key, outcome);
                remove_finalizer(&api, obj.as_ref())
                    .await
                    .map_err(|e| fail(e.into(), ctx.next_backoff(&key)))?;
                ctx.reset_backoff(&key);
                Ok(Action::await_change())
            }
            Err(e) => {
                let status = deleting_status(obj.status(), &e, chrono::Utc::now());
                match serde_json::to_value(status) {
                    Ok(status) => {
                        if let Err(patch_err) = patch_status(&api, &name, status).await {
                            warn!("Failed to record deletion status for {}: {}", key, patch_err);
                        }
                    }
                    Err(encode_err) => warn!("Failed to encode status for {}: {}", key, encode_err),
                }
                let delay = failure_delay(&ctx, &key, &e);
                Err(fail(e, delay))
            }
        };
    }

    if !obj.is_initialized() {
        add_finalizer(&api, obj.as_ref())
            .await
            .map_err(|e| fail(e.into(), ctx.next_backoff(&key)))?;
        return Ok(Action::await_change());
    }

    if let Some(remaining) = skip_remaining(obj.meta().generation, obj.status(), chrono::Utc::now()) {
        debug!(
            "Skipping {}: spec unchanged, next pass in {}s",
            key,
            remaining.as_secs()
        );
        return Ok(Action::requeue(remaining));
    }

    metrics::increment_reconciliations(&kind);
    let started = Instant::now();
    let span = tracing::info_span!(
        "controller.reconcile",
        resource.kind = kind.as_str(),
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        resource.generation = obj.meta().generation.unwrap_or(0)
    );
    let outcome: PassOutcome = obj.sync(&ctx.engine).instrument(span).await;

    let delay = match &outcome.result {
        Ok(_) => ctx.config.resync_interval(),
        Err(e) => failure_delay(&ctx, &key, e),
    };
    let now = chrono::Utc::now();
    let status = obj
        .status_after(&outcome, now, schedule_after(delay))
        .map_err(|e| fail(crate::store::StoreError::Encode(e).into(), delay))?;
    let patched = patch_status(&api, &name, status).await;
    metrics::observe_reconciliation_duration(&kind, started.elapsed().as_secs_f64());

    match outcome.result {
        Ok(sync) => {
            metrics::increment_sync_outcome(&kind, sync.as_str());
            ctx.reset_backoff(&key);
            patched.map_err(|e| fail(e.into(), ctx.next_backoff(&key)))?;
            metrics::increment_requeues_total("resync");
            Ok(Action::requeue(delay))
        }
        Err(e) if e.retry_policy() == RetryPolicy::Poll => {
            info!("⏳ {} is waiting: {}", key, e);
            if let Err(patch_err) = patched {
                warn!("Failed to record status for {}: {}", key, patch_err);
            }
            metrics::increment_requeues_total("awaiting-input");
            Ok(Action::requeue(delay))
        }
        Err(e) => {
            if let Err(patch_err) = patched {
                warn!("Failed to record status for {}: {}", key, patch_err);
            }
            Err(fail(e, delay))
        }
    }
}

/// Run the controller for one kind until shutdown, restarting the watch when it ends
///
/// # Errors
///
/// Currently never fails; the signature leaves room for startup checks.
pub async fn run_controller<K>(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> anyhow::Result<()>
where
    K: ManagedResource + Resource<Scope = NamespaceResourceScope>,
{
    let kind = K::kind(&()).to_string();
    let config: ControllerConfig = reconciler.config.clone();

    loop {
        if !server_state.is_ready() {
            break;
        }
        info!("Starting {} controller watch...", kind);
        let api: Api<K> = Api::all(client.clone());
        let restart_delay = config.watch_restart_delay();
        let kind_for_stream = kind.clone();

        Controller::new(api, watcher::Config::default().any_semantic())
            .with_config(controller::Config::default().concurrency(config.max_concurrent_reconciles))
            .shutdown_on_signal()
            .run(reconcile::<K>, error_policy::<K>, reconciler.clone())
            .for_each(move |event| {
                let kind = kind_for_stream.clone();
                async move {
                    match event {
                        Ok((object, _action)) => debug!("{} {} reconciled", kind, object.name),
                        // already handled by the error policy
                        Err(controller::Error::ReconcilerFailed(_, _)) => {}
                        Err(e) => {
                            handle_watch_stream_error(&kind, &format!("{e:?}"), restart_delay).await;
                        }
                    }
                }
            })
            .await;

        if !server_state.is_ready() {
            break;
        }
        warn!(
            "{} watch stream ended, restarting in {}s...",
            kind,
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("{} controller stopped", kind);
    Ok(())
}

/// Run one controller per managed kind concurrently
///
/// # Errors
///
/// The first controller failure.
pub async fn run_controllers(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> anyhow::Result<()> {
    tokio::try_join!(
        run_controller::<Policy>(client.clone(), reconciler.clone(), server_state.clone()),
        run_controller::<SecretEngineMount>(client.clone(), reconciler.clone(), server_state.clone()),
        run_controller::<AuthEngineMount>(client.clone(), reconciler.clone(), server_state.clone()),
        run_controller::<DatabaseSecretEngineConfig>(
            client.clone(),
            reconciler.clone(),
            server_state.clone()
        ),
        run_controller::<LdapAuthEngineConfig>(client.clone(), reconciler.clone(), server_state.clone()),
        run_controller::<RandomSecret>(client.clone(), reconciler.clone(), server_state.clone()),
        run_controller::<PkiSecretEngineConfig>(client, reconciler, server_state),
    )?;
    info!("All controllers stopped gracefully");
    Ok(())
}
