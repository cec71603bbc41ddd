//! # Vault Client
//!
//! The service-client seam. The reconciliation engine, credential resolver and
//! PKI lifecycle only ever talk to Vault through [`VaultClient`], so tests can
//! substitute an in-memory implementation.

mod error;
mod http;

pub use error::VaultError;
pub use http::VaultHttpClient;

use async_trait::async_trait;
use serde_json::Value;
use zeroize::Zeroizing;

/// Flat key/value body exchanged with Vault
pub type Payload = serde_json::Map<String, Value>;

/// Where and how to reach a Vault server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaultTarget {
    /// Base address without the `/v1` prefix
    pub address: String,
    pub namespace: Option<String>,
    /// Extra PEM trust roots
    pub ca_pem: Option<String>,
    pub skip_verify: bool,
}

/// Kubernetes auth method login
pub struct LoginRequest {
    /// Auth mount, e.g. `kubernetes`
    pub mount: String,
    pub role: String,
    pub jwt: Zeroizing<String>,
    /// Namespace to log in to; defaults to the target namespace
    pub namespace: Option<String>,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("mount", &self.mount)
            .field("role", &self.role)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

/// Authenticated handle for one reconciliation pass. Never cached across passes.
#[derive(Clone)]
pub struct VaultSession {
    pub target: VaultTarget,
    token: Zeroizing<String>,
}

impl VaultSession {
    #[must_use]
    pub fn new(target: VaultTarget, token: impl Into<String>) -> Self {
        Self {
            target,
            token: Zeroizing::new(token.into()),
        }
    }

    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for VaultSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSession")
            .field("address", &self.target.address)
            .field("namespace", &self.target.namespace)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Vault HTTP API operations used by the operator
#[async_trait]
pub trait VaultClient: Send + Sync {
    /// Exchange a service account JWT for a Vault token
    async fn login(
        &self,
        target: &VaultTarget,
        request: &LoginRequest,
    ) -> Result<VaultSession, VaultError>;

    /// Read `path`. `Ok(None)` when nothing exists there.
    async fn read(&self, session: &VaultSession, path: &str) -> Result<Option<Payload>, VaultError>;

    /// Write `payload` to `path`, returning the response `data` if any
    async fn write(
        &self,
        session: &VaultSession,
        path: &str,
        payload: &Payload,
    ) -> Result<Option<Payload>, VaultError>;

    /// Delete `path`. A missing path yields [`VaultError::NotFound`].
    async fn delete(&self, session: &VaultSession, path: &str) -> Result<(), VaultError>;
}

/// Unwrap a kv version 2 read (`{data: {...}, metadata: {...}}`) to its inner data.
/// Other payloads are returned unchanged.
#[must_use]
pub fn unwrap_kv_data(payload: Payload) -> Payload {
    let is_kv_v2 = matches!(payload.get("data"), Some(Value::Object(_)))
        && matches!(payload.get("metadata"), Some(Value::Object(_)));
    if !is_kv_v2 {
        return payload;
    }
    match payload.into_iter().find(|(key, _)| key == "data") {
        Some((_, Value::Object(inner))) => inner,
        _ => Payload::new(),
    }
}

/// Wrap a payload for a kv version 2 write
#[must_use]
pub fn wrap_kv_data(payload: Payload) -> Payload {
    let mut wrapped = Payload::new();
    wrapped.insert("data".to_string(), Value::Object(payload));
    wrapped
}

/// Read a string field out of a payload
#[must_use]
pub fn string_field<'a>(payload: &'a Payload, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_unwrap_kv_v2() {
        let payload = as_payload(json!({
            "data": { "password": "s3cret" },
            "metadata": { "version": 3 }
        }));
        let inner = unwrap_kv_data(payload);
        assert_eq!(string_field(&inner, "password"), Some("s3cret"));
    }

    #[test]
    fn test_unwrap_kv_v1_untouched() {
        let payload = as_payload(json!({ "data": { "nested": true }, "password": "x" }));
        let same = unwrap_kv_data(payload.clone());
        assert_eq!(same, payload);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = VaultSession::new(
            VaultTarget {
                address: "https://vault:8200".to_string(),
                namespace: None,
                ca_pem: None,
                skip_verify: false,
            },
            "hvs.secret-token",
        );
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("hvs.secret-token"));
        assert_eq!(session.token(), "hvs.secret-token");
    }
}
