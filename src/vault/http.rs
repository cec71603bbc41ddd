//! Vault REST client
//!
//! Native reqwest implementation of [`VaultClient`] against the Vault HTTP API.
//!
//! - Uses reqwest with rustls (no OpenSSL dependencies)
//! - Works directly with Pact HTTP mock servers
//! - One underlying HTTP client per TLS profile, shared across passes

use super::{LoginRequest, Payload, VaultClient, VaultError, VaultSession, VaultTarget};
use crate::observability::metrics;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, Instrument};

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TlsProfile {
    ca_pem: Option<String>,
    skip_verify: bool,
}

/// Vault HTTP API client
pub struct VaultHttpClient {
    timeout: Duration,
    clients: Mutex<HashMap<TlsProfile, Client>>,
}

impl std::fmt::Debug for VaultHttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultHttpClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl VaultHttpClient {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// HTTP client for the target's TLS profile, built on first use
    fn http_client(&self, target: &VaultTarget) -> Result<Client, VaultError> {
        let profile = TlsProfile {
            ca_pem: target.ca_pem.clone(),
            skip_verify: target.skip_verify,
        };
        let mut clients = self
            .clients
            .lock()
            .map_err(|e| VaultError::InvalidTarget(format!("client cache unavailable: {e}")))?;
        if let Some(client) = clients.get(&profile) {
            return Ok(client.clone());
        }

        let mut builder = Client::builder().timeout(self.timeout);
        if let Some(pem) = &profile.ca_pem {
            let certs = reqwest::Certificate::from_pem_bundle(pem.as_bytes()).map_err(|e| {
                VaultError::InvalidTarget(format!("CA bundle is not valid PEM: {e}"))
            })?;
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }
        if profile.skip_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let client = builder
            .build()
            .map_err(|e| VaultError::InvalidTarget(format!("failed to build HTTP client: {e}")))?;
        clients.insert(profile, client.clone());
        Ok(client)
    }

    /// Build HTTP request with Vault headers
    fn make_request(
        client: &Client,
        method: Method,
        target: &VaultTarget,
        namespace: Option<&str>,
        token: Option<&str>,
        path: &str,
        body: Option<&Payload>,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/v1/{}", target.address.trim_end_matches('/'), path);
        let mut request = client.request(method, &url);
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }
        if let Some(namespace) = namespace.filter(|ns| !ns.is_empty()) {
            request = request.header(NAMESPACE_HEADER, namespace);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
    }

    /// Send a request and decode the Vault response envelope
    async fn execute(
        request: reqwest::RequestBuilder,
        operation: &'static str,
        path: &str,
    ) -> Result<Option<Value>, VaultError> {
        let start = Instant::now();
        let result: Result<Option<Value>, VaultError> = async {
            let response = request.send().await.map_err(|source| VaultError::Transport {
                path: path.to_string(),
                source,
            })?;
            let status = response.status();
            let body = response.text().await.map_err(|source| VaultError::Transport {
                path: path.to_string(),
                source,
            })?;

            if !status.is_success() {
                return Err(VaultError::from_status(status.as_u16(), path, &body));
            }
            if status == StatusCode::NO_CONTENT || body.trim().is_empty() {
                return Ok(None);
            }
            serde_json::from_str::<Value>(&body)
                .map(Some)
                .map_err(|e| VaultError::Decode {
                    path: path.to_string(),
                    message: e.to_string(),
                })
        }
        .await;

        metrics::observe_vault_operation(operation, start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            if !e.is_not_found() {
                metrics::increment_vault_operation_errors(operation, e.as_str());
            }
        }
        result
    }
}

fn data_of(envelope: Option<Value>) -> Option<Payload> {
    match envelope? {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(data)) => Some(data),
            _ => None,
        },
        _ => None,
    }
}

#[async_trait]
impl VaultClient for VaultHttpClient {
    async fn login(
        &self,
        target: &VaultTarget,
        request: &LoginRequest,
    ) -> Result<VaultSession, VaultError> {
        let path = vault_paths::operations::auth_login(&request.mount);
        let span = tracing::debug_span!(
            "vault.login",
            vault.path = %path,
            vault.role = %request.role
        );
        async {
            let client = self.http_client(target)?;
            let mut body = Payload::new();
            body.insert("role".to_string(), Value::String(request.role.clone()));
            body.insert("jwt".to_string(), Value::String(request.jwt.to_string()));
            let namespace = request
                .namespace
                .as_deref()
                .or(target.namespace.as_deref());
            let http = Self::make_request(
                &client,
                Method::POST,
                target,
                namespace,
                None,
                &path,
                Some(&body),
            );
            let envelope = Self::execute(http, "login", &path).await?;
            let token = envelope
                .as_ref()
                .and_then(|v| v.get("auth"))
                .and_then(|auth| auth.get("client_token"))
                .and_then(Value::as_str)
                .filter(|token| !token.is_empty())
                .ok_or_else(|| VaultError::MissingToken { path: path.clone() })?;
            debug!("Logged in to Vault at {}", target.address);
            Ok(VaultSession::new(target.clone(), token))
        }
        .instrument(span)
        .await
    }

    async fn read(&self, session: &VaultSession, path: &str) -> Result<Option<Payload>, VaultError> {
        let span = tracing::debug_span!("vault.read", vault.path = %path);
        async {
            let client = self.http_client(&session.target)?;
            let http = Self::make_request(
                &client,
                Method::GET,
                &session.target,
                session.target.namespace.as_deref(),
                Some(session.token()),
                path,
                None,
            );
            match Self::execute(http, "read", path).await {
                Ok(envelope) => Ok(Some(data_of(envelope).unwrap_or_default())),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e),
            }
        }
        .instrument(span)
        .await
    }

    async fn write(
        &self,
        session: &VaultSession,
        path: &str,
        payload: &Payload,
    ) -> Result<Option<Payload>, VaultError> {
        let span = tracing::debug_span!("vault.write", vault.path = %path);
        async {
            let client = self.http_client(&session.target)?;
            let http = Self::make_request(
                &client,
                Method::POST,
                &session.target,
                session.target.namespace.as_deref(),
                Some(session.token()),
                path,
                Some(payload),
            );
            Ok(data_of(Self::execute(http, "write", path).await?))
        }
        .instrument(span)
        .await
    }

    async fn delete(&self, session: &VaultSession, path: &str) -> Result<(), VaultError> {
        let span = tracing::debug_span!("vault.delete", vault.path = %path);
        async {
            let client = self.http_client(&session.target)?;
            let http = Self::make_request(
                &client,
                Method::DELETE,
                &session.target,
                session.target.namespace.as_deref(),
                Some(session.token()),
                path,
                None,
            );
            Self::execute(http, "delete", path).await.map(|_| ())
        }
        .instrument(span)
        .await
    }
}
