//! # Vault Config Operator
//!
//! Kubernetes operator that keeps Vault configuration in line with custom
//! resources. See [`vault_config_operator::runtime`] for the startup sequence
//! and the per-kind watch loops.

use anyhow::Result;
use vault_config_operator::observability::otel::shutdown_otel;
use vault_config_operator::runtime::{initialize, run_controllers};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    let result = run_controllers(
        init.client.clone(),
        init.reconciler.clone(),
        init.server_state.clone(),
    )
    .await;
    shutdown_otel(init.otel_tracer_provider);
    result
}
