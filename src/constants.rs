//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable (see [`crate::config::ControllerConfig`]).

/// API group of every custom resource managed here
pub const API_GROUP: &str = "vault.octopilot.io";

/// Finalizer guarding remote cleanup
pub const FINALIZER: &str = "vault.octopilot.io/finalizer";

/// Field manager used for status and metadata patches
pub const FIELD_MANAGER: &str = "vault-config-operator";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default resync interval after a successful pass (seconds)
/// Drives periodic drift detection against Vault
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default requeue interval while waiting on external input, such as an
/// externally signed intermediate certificate (seconds)
pub const DEFAULT_AWAITING_INPUT_REQUEUE_SECS: u64 = 60;

/// Default requeue interval after a validation failure (seconds)
/// Validation failures need a spec change, so this is only a safety net
pub const DEFAULT_VALIDATION_REQUEUE_SECS: u64 = 3600;

/// Fibonacci backoff floor (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Fibonacci backoff ceiling (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default Vault address when neither the resource nor `VAULT_ADDR` sets one
pub const DEFAULT_VAULT_ADDR: &str = "https://vault.vault.svc:8200";

/// Lifetime requested for projected service account tokens (seconds)
/// The Kubernetes API enforces a minimum of 600
pub const DEFAULT_SERVICE_ACCOUNT_TOKEN_TTL_SECS: i64 = 600;

/// Default timeout for a single Vault HTTP request (seconds)
pub const DEFAULT_VAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Delay before restarting a watch stream that ended or failed (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Default maximum number of concurrent reconciliations per kind
pub const DEFAULT_MAX_CONCURRENT_RECONCILES: u16 = 10;

/// Key holding a PEM CA bundle in a TLS secret
pub const TLS_CA_KEY: &str = "ca.crt";

/// Default key holding an externally signed certificate
pub const DEFAULT_SIGNED_CERT_KEY: &str = "tls.crt";

/// Suffix of the companion secret created when exporting CA material
pub const EXPORT_SECRET_SUFFIX: &str = "-ca-export";
