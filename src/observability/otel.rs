//! # OpenTelemetry Support
//!
//! Datadog trace export via `datadog-opentelemetry`, enabled only when
//! `DD_API_KEY` is present in the environment. Without it the operator logs
//! through the plain `tracing-subscriber` formatter.

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_SERVICE_NAME: &str = "vault-config-operator";
const DEFAULT_SITE: &str = "datadoghq.com";
const DEFAULT_AGENT_URL: &str = "http://localhost:8126";

/// Tracer provider handle for graceful shutdown
#[derive(Debug)]
pub enum TracerProviderHandle {
    Datadog(opentelemetry_sdk::trace::SdkTracerProvider),
}

/// Datadog settings read from `DD_*` environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatadogSettings {
    pub service_name: Option<String>,
    pub service_version: Option<String>,
    pub environment: Option<String>,
    pub site: Option<String>,
}

impl DatadogSettings {
    /// `None` unless `DD_API_KEY` is set
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var("DD_API_KEY").ok()?;
        Some(Self {
            service_name: std::env::var("DD_SERVICE").ok(),
            service_version: std::env::var("DD_VERSION").ok(),
            environment: std::env::var("DD_ENV").ok(),
            site: std::env::var("DD_SITE").ok(),
        })
    }
}

/// Initialize Datadog tracing if configured
///
/// Returns `Ok(None)` when no `DD_API_KEY` is present.
///
/// # Errors
///
/// Reserved for initialization failures of the tracer provider.
pub fn init_otel() -> Result<Option<TracerProviderHandle>> {
    match DatadogSettings::from_env() {
        Some(settings) => init_datadog(&settings),
        None => {
            if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
                warn!("OTEL_EXPORTER_OTLP_ENDPOINT is set but only Datadog export is supported");
            }
            Ok(None)
        }
    }
}

fn set_default_env(key: &str, value: Option<&str>, default: impl FnOnce() -> String) {
    if let Some(value) = value {
        std::env::set_var(key, value);
    } else if std::env::var(key).is_err() {
        std::env::set_var(key, default());
    }
}

/// Export the settings where `datadog-opentelemetry` reads them, then start the provider
fn init_datadog(settings: &DatadogSettings) -> Result<Option<TracerProviderHandle>> {
    set_default_env("DD_SERVICE", settings.service_name.as_deref(), || {
        DEFAULT_SERVICE_NAME.to_string()
    });
    // Version tracks the build so traces line up with deployments
    set_default_env("DD_VERSION", settings.service_version.as_deref(), || {
        format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("BUILD_GIT_HASH"))
    });
    if let Some(environment) = &settings.environment {
        std::env::set_var("DD_ENV", environment);
    }
    set_default_env("DD_SITE", settings.site.as_deref(), || DEFAULT_SITE.to_string());
    set_default_env("DD_TRACE_AGENT_URL", None, || DEFAULT_AGENT_URL.to_string());

    info!(
        "Initializing Datadog OpenTelemetry tracing: service={}, version={}, env={:?}, site={}",
        std::env::var("DD_SERVICE").unwrap_or_default(),
        std::env::var("DD_VERSION").unwrap_or_default(),
        std::env::var("DD_ENV").ok(),
        std::env::var("DD_SITE").unwrap_or_default()
    );

    let tracer_provider = datadog_opentelemetry::tracing().init();

    info!(
        "✅ Datadog tracing initialized, sending to {}",
        std::env::var("DD_TRACE_AGENT_URL").unwrap_or_default()
    );
    Ok(Some(TracerProviderHandle::Datadog(tracer_provider)))
}

/// Flush pending spans and shut down
pub fn shutdown_otel(tracer_provider: Option<TracerProviderHandle>) {
    if let Some(TracerProviderHandle::Datadog(provider)) = tracer_provider {
        info!("Shutting down Datadog tracer provider...");
        if let Err(e) = provider.shutdown_with_timeout(Duration::from_secs(5)) {
            warn!("Error shutting down Datadog tracer provider: {}", e);
        }
    }
}
