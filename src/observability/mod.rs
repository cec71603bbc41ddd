//! # Observability
//!
//! - `metrics`: Prometheus metrics collection
//! - `otel`: Datadog / OpenTelemetry tracing

pub mod metrics;
pub mod otel;
