//! Common test utilities
//!
//! rustls setup for the Pact tests, plus in-memory stand-ins for the two
//! seams the engine talks through: [`FakeVault`] and [`FakeStore`].

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use vault_config_operator::clients::Clients;
use vault_config_operator::config::VaultDefaults;
use vault_config_operator::controller::reconciler::Engine;
use vault_config_operator::crd::{PkiSecretEngineConfig, RandomSecret};
use vault_config_operator::store::{ObjectStore, SecretData, StoreError};
use vault_config_operator::vault::{
    LoginRequest, Payload, VaultClient, VaultError, VaultSession, VaultTarget,
};
use zeroize::Zeroizing;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` to ensure it's only called once across all tests.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Build a JSON object payload
pub fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

const MOUNT_TABLES: [&str; 2] = ["sys/mounts", "sys/auth"];

/// One recorded Vault call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login { mount: String, role: String },
    Read(String),
    Write(String),
    Delete(String),
}

/// In-memory Vault: paths map to payloads, writes store what was sent
///
/// Writes to a path with a canned response (see [`FakeVault::respond`])
/// return that response instead of echoing nothing, which is how the PKI
/// generate and sign endpoints are simulated.
///
/// Mount tables behave like Vault's: enabling a mount lists it under
/// `sys/mounts` or `sys/auth`, and reading `<mount>/tune` for a mount that
/// was never enabled fails with 400.
#[derive(Debug, Default)]
pub struct FakeVault {
    data: Mutex<HashMap<String, Payload>>,
    responses: Mutex<HashMap<String, Payload>>,
    written: Mutex<Vec<(String, Payload)>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeVault {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Put `value` at `path` as if something had written it earlier
    pub fn seed(&self, path: &str, value: Value) {
        self.data.lock().unwrap().insert(path.to_string(), payload(value));
    }

    /// Answer writes to `path` with `value`
    pub fn respond(&self, path: &str, value: Value) {
        self.responses
            .lock()
            .unwrap()
            .insert(path.to_string(), payload(value));
    }

    pub fn stored(&self, path: &str) -> Option<Payload> {
        self.data.lock().unwrap().get(path).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
        self.written.lock().unwrap().clear();
    }

    /// Paths written, in order
    pub fn writes(&self) -> Vec<String> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Body of the last write to `path`
    pub fn last_write(&self, path: &str) -> Option<Payload> {
        self.written
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(written, _)| written == path)
            .map(|(_, body)| body.clone())
    }

    fn register_mount(&self, path: &str, body: &Payload) {
        for table in MOUNT_TABLES {
            let Some(mount) = path.strip_prefix(table).and_then(|rest| rest.strip_prefix('/')) else {
                continue;
            };
            if mount.ends_with("/tune") {
                continue;
            }
            self.data
                .lock()
                .unwrap()
                .entry(table.to_string())
                .or_default()
                .insert(format!("{mount}/"), Value::Object(body.clone()));
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VaultClient for FakeVault {
    async fn login(
        &self,
        target: &VaultTarget,
        request: &LoginRequest,
    ) -> Result<VaultSession, VaultError> {
        self.record(Call::Login {
            mount: request.mount.clone(),
            role: request.role.clone(),
        });
        Ok(VaultSession::new(target.clone(), format!("token-{}", request.role)))
    }

    async fn read(&self, _session: &VaultSession, path: &str) -> Result<Option<Payload>, VaultError> {
        self.record(Call::Read(path.to_string()));
        match self.stored(path) {
            None if path.ends_with("/tune") => Err(VaultError::from_status(
                400,
                path,
                r#"{"errors":["cannot fetch sysview for path"]}"#,
            )),
            stored => Ok(stored),
        }
    }

    async fn write(
        &self,
        _session: &VaultSession,
        path: &str,
        body: &Payload,
    ) -> Result<Option<Payload>, VaultError> {
        self.record(Call::Write(path.to_string()));
        self.written
            .lock()
            .unwrap()
            .push((path.to_string(), body.clone()));
        self.data
            .lock()
            .unwrap()
            .insert(path.to_string(), body.clone());
        self.register_mount(path, body);
        Ok(self.responses.lock().unwrap().get(path).cloned())
    }

    async fn delete(&self, _session: &VaultSession, path: &str) -> Result<(), VaultError> {
        self.record(Call::Delete(path.to_string()));
        match self.data.lock().unwrap().remove(path) {
            Some(_) => Ok(()),
            None => Err(VaultError::NotFound {
                path: path.to_string(),
            }),
        }
    }
}

/// In-memory object store keyed by `(namespace, name)`
#[derive(Debug, Default)]
pub struct FakeStore {
    secrets: Mutex<BTreeMap<(String, String), SecretData>>,
    random_secrets: Mutex<BTreeMap<(String, String), RandomSecret>>,
    pki_configs: Mutex<BTreeMap<(String, String), PkiSecretEngineConfig>>,
    created: Mutex<Vec<Secret>>,
    lookups: AtomicUsize,
}

fn key(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_string(), name.to_string())
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn put_secret(&self, namespace: &str, name: &str, entries: &[(&str, &str)]) {
        let data = entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.as_bytes().to_vec()))
            .collect();
        self.secrets.lock().unwrap().insert(key(namespace, name), data);
    }

    pub fn put_random_secret(&self, namespace: &str, secret: RandomSecret) {
        let name = secret.metadata.name.clone().unwrap_or_default();
        self.random_secrets
            .lock()
            .unwrap()
            .insert(key(namespace, &name), secret);
    }

    pub fn put_pki_config(&self, namespace: &str, pki: PkiSecretEngineConfig) {
        let name = pki.metadata.name.clone().unwrap_or_default();
        self.pki_configs.lock().unwrap().insert(key(namespace, &name), pki);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<SecretData> {
        self.secrets.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    /// Secrets passed to `create_secret`, in order
    pub fn created(&self) -> Vec<Secret> {
        self.created.lock().unwrap().clone()
    }

    /// Number of secret, RandomSecret and PKI lookups so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.lookups.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<SecretData>, StoreError> {
        self.count();
        Ok(self.secret(namespace, name))
    }

    async fn create_secret(&self, secret: Secret) -> Result<(), StoreError> {
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        let mut secrets = self.secrets.lock().unwrap();
        if secrets.contains_key(&key(&namespace, &name)) {
            return Err(StoreError::AlreadyExists {
                kind: "Secret",
                namespace,
                name,
            });
        }
        let mut data: SecretData = secret
            .data
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.0))
            .collect();
        for (k, v) in secret.string_data.clone().unwrap_or_default() {
            data.insert(k, v.into_bytes());
        }
        secrets.insert(key(&namespace, &name), data);
        self.created.lock().unwrap().push(secret);
        Ok(())
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.secrets.lock().unwrap().remove(&key(namespace, name));
        Ok(())
    }

    async fn get_random_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RandomSecret>, StoreError> {
        self.count();
        Ok(self
            .random_secrets
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned())
    }

    async fn get_pki_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PkiSecretEngineConfig>, StoreError> {
        self.count();
        Ok(self
            .pki_configs
            .lock()
            .unwrap()
            .get(&key(namespace, name))
            .cloned())
    }

    async fn service_account_token(
        &self,
        _namespace: &str,
        service_account: &str,
        _audiences: &[String],
        _ttl_secs: i64,
    ) -> Result<Zeroizing<String>, StoreError> {
        Ok(Zeroizing::new(format!("jwt-for-{service_account}")))
    }
}

/// Engine wired to fresh fakes
pub struct Harness {
    pub vault: Arc<FakeVault>,
    pub store: Arc<FakeStore>,
    pub engine: Engine,
}

impl Harness {
    pub fn new() -> Self {
        let vault = FakeVault::new();
        let store = FakeStore::new();
        let clients = Clients::new(store.clone(), vault.clone());
        let engine = Engine::new(clients, VaultDefaults::default(), 600);
        Self {
            vault,
            store,
            engine,
        }
    }

    pub fn clients(&self) -> Clients {
        self.engine.clients().clone()
    }
}

/// Deserialize a namespaced custom resource of `kind` in `team-a`
pub fn resource<K: serde::de::DeserializeOwned>(kind: &str, name: &str, spec: Value) -> K {
    serde_json::from_value(serde_json::json!({
        "apiVersion": "vault.octopilot.io/v1alpha1",
        "kind": kind,
        "metadata": {"name": name, "namespace": "team-a", "generation": 1},
        "spec": spec,
    }))
    .unwrap_or_else(|e| panic!("invalid {kind} fixture: {e}"))
}
