//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_AWAITING_INPUT_REQUEUE_SECS, DEFAULT_BACKOFF_MAX_MINUTES, DEFAULT_BACKOFF_MIN_MINUTES,
    DEFAULT_MAX_CONCURRENT_RECONCILES, DEFAULT_METRICS_PORT, DEFAULT_RESYNC_INTERVAL_SECS,
    DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
    DEFAULT_SERVICE_ACCOUNT_TOKEN_TTL_SECS, DEFAULT_VALIDATION_REQUEUE_SECS, DEFAULT_VAULT_ADDR,
    DEFAULT_VAULT_REQUEST_TIMEOUT_SECS, DEFAULT_WATCH_RESTART_DELAY_SECS,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// HTTP port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// How long to wait for the HTTP server to come up (seconds)
    pub server_startup_timeout_secs: u64,
    /// Readiness poll interval while waiting for the server (milliseconds)
    pub server_poll_interval_ms: u64,
    /// Requeue interval after a successful pass (seconds)
    pub resync_interval_secs: u64,
    /// Requeue interval while a resource waits on external input (seconds)
    pub awaiting_input_requeue_secs: u64,
    /// Requeue interval after a validation failure (seconds)
    pub validation_requeue_secs: u64,
    /// Fibonacci backoff floor (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff ceiling (minutes)
    pub backoff_max_minutes: u64,
    /// Maximum concurrent reconciliations per resource kind
    pub max_concurrent_reconciles: u16,
    /// Delay before a failed or ended watch stream is restarted (seconds)
    pub watch_restart_delay_secs: u64,
    /// Lifetime requested for service account tokens (seconds)
    pub service_account_token_ttl_secs: i64,
    /// Vault connection defaults applied when a resource has no override
    pub vault: VaultDefaults,
}

/// Vault connection defaults
///
/// Read from the same variables the Vault CLI uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultDefaults {
    /// `VAULT_ADDR`
    pub address: String,
    /// `VAULT_NAMESPACE`
    pub namespace: Option<String>,
    /// `VAULT_CACERT`, path to a PEM bundle on disk
    pub ca_cert_file: Option<String>,
    /// `VAULT_SKIP_VERIFY`
    pub skip_verify: bool,
    /// Per-request timeout (seconds)
    pub request_timeout_secs: u64,
}

impl Default for VaultDefaults {
    fn default() -> Self {
        Self {
            address: DEFAULT_VAULT_ADDR.to_string(),
            namespace: None,
            ca_cert_file: None,
            skip_verify: false,
            request_timeout_secs: DEFAULT_VAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl VaultDefaults {
    /// Load Vault defaults from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            address: env_var_or_default_str("VAULT_ADDR", DEFAULT_VAULT_ADDR),
            namespace: env_var_non_empty("VAULT_NAMESPACE"),
            ca_cert_file: env_var_non_empty("VAULT_CACERT"),
            skip_verify: env_var_or_default_bool("VAULT_SKIP_VERIFY", false),
            request_timeout_secs: env_var_or_default(
                "VAULT_REQUEST_TIMEOUT_SECS",
                DEFAULT_VAULT_REQUEST_TIMEOUT_SECS,
            ),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            awaiting_input_requeue_secs: DEFAULT_AWAITING_INPUT_REQUEUE_SECS,
            validation_requeue_secs: DEFAULT_VALIDATION_REQUEUE_SECS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            max_concurrent_reconciles: DEFAULT_MAX_CONCURRENT_RECONCILES,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            service_account_token_ttl_secs: DEFAULT_SERVICE_ACCOUNT_TOKEN_TTL_SECS,
            vault: VaultDefaults::default(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            server_startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            server_poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
            resync_interval_secs: env_var_or_default(
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            awaiting_input_requeue_secs: env_var_or_default(
                "AWAITING_INPUT_REQUEUE_SECS",
                DEFAULT_AWAITING_INPUT_REQUEUE_SECS,
            ),
            validation_requeue_secs: env_var_or_default(
                "VALIDATION_REQUEUE_SECS",
                DEFAULT_VALIDATION_REQUEUE_SECS,
            ),
            backoff_min_minutes: env_var_or_default(
                "BACKOFF_MIN_MINUTES",
                DEFAULT_BACKOFF_MIN_MINUTES,
            ),
            backoff_max_minutes: env_var_or_default(
                "BACKOFF_MAX_MINUTES",
                DEFAULT_BACKOFF_MAX_MINUTES,
            ),
            max_concurrent_reconciles: env_var_or_default(
                "MAX_CONCURRENT_RECONCILES",
                DEFAULT_MAX_CONCURRENT_RECONCILES,
            ),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            service_account_token_ttl_secs: env_var_or_default(
                "SERVICE_ACCOUNT_TOKEN_TTL_SECS",
                DEFAULT_SERVICE_ACCOUNT_TOKEN_TTL_SECS,
            ),
            vault: VaultDefaults::from_env(),
        }
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn awaiting_input_requeue(&self) -> Duration {
        Duration::from_secs(self.awaiting_input_requeue_secs)
    }

    pub fn validation_requeue(&self) -> Duration {
        Duration::from_secs(self.validation_requeue_secs)
    }

    pub fn server_startup_timeout(&self) -> Duration {
        Duration::from_secs(self.server_startup_timeout_secs)
    }

    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }

    pub fn server_poll_interval(&self) -> Duration {
        Duration::from_millis(self.server_poll_interval_ms)
    }
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_var_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
