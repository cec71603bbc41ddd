//! # Initialization
//!
//! Startup in order: rustls provider, OpenTelemetry and tracing, metrics,
//! the HTTP server, the Kubernetes client, then the reconciler context.

use crate::clients::Clients;
use crate::config::ControllerConfig;
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::observability;
use crate::store::KubeObjectStore;
use crate::vault::VaultHttpClient;
use anyhow::{anyhow, Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn};

const DEFAULT_LOG_FILTER: &str = "vault_config_operator=info";

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    /// Present when Datadog export is enabled
    pub otel_tracer_provider: Option<observability::otel::TracerProviderHandle>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

fn init_tracing(otel_enabled: bool) {
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .try_init();
    if let Err(e) = result {
        // datadog-opentelemetry may have installed its own subscriber
        if otel_enabled {
            warn!("Tracing subscriber already initialized: {}", e);
        } else {
            eprintln!("Failed to initialize tracing subscriber: {e}");
        }
    }
}

/// Initialize the operator runtime
///
/// # Errors
///
/// Metrics registration, server startup or Kubernetes client failures.
pub async fn initialize() -> Result<InitializationResult> {
    // Must happen before anything touches rustls
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(anyhow!("Failed to install rustls crypto provider"));
    }

    let otel_tracer_provider =
        observability::otel::init_otel().context("Failed to initialize OpenTelemetry")?;
    init_tracing(otel_tracer_provider.is_some());

    info!("Starting Vault Config Operator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let config = ControllerConfig::from_env();
    info!(
        "Vault default address {}, resync every {}s, backoff {}-{}m",
        config.vault.address,
        config.resync_interval_secs,
        config.backoff_min_minutes,
        config.backoff_max_minutes
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_handle = {
        let state = server_state.clone();
        let port = config.metrics_port;
        tokio::spawn(async move {
            if let Err(e) = start_server(port, state).await {
                error!("HTTP server error: {}", e);
            }
        })
    };
    wait_for_server_ready(&server_state, &server_handle, &config).await?;

    let client = Client::try_default().await?;
    let clients = Clients::new(
        Arc::new(KubeObjectStore::new(client.clone())),
        Arc::new(VaultHttpClient::new(config.vault.request_timeout())),
    );
    let reconciler = Arc::new(Reconciler::new(client.clone(), clients, config));

    // Mark not ready on SIGINT/SIGTERM so the watch loops stop restarting
    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, initiating graceful shutdown...");
            shutdown_state.set_ready(false);
        }
    });

    info!("Operator initialized, starting watch loops...");
    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
        otel_tracer_provider,
    })
}

async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ControllerConfig,
) -> Result<()> {
    let startup_timeout = config.server_startup_timeout();
    let poll_interval = config.server_poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow!("HTTP server failed to start"));
        }
        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }
        if start_time.elapsed() > startup_timeout {
            return Err(anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }
        tokio::time::sleep(poll_interval).await;
    }
}
