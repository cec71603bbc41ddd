//! Secret engine and auth method mounts
//!
//! Creation posts the full mount definition to `sys/mounts/<path>` or
//! `sys/auth/<path>`. Afterwards only the tunable subset can change, so
//! reads and updates go through `<mount>/tune`.
//!
//! Vault answers a tune read for a missing mount with 400, not 404, so
//! existence is decided from the `sys/mounts` (or `sys/auth`) listing first.

use super::{put_list, put_str, Comparison, InternalValues, PrepareContext, VaultObject};
use crate::crd::{
    AuthEngineMount, KubeAuthConfiguration, MountConfig, MountDefinition, SecretEngineMount,
    VaultConnection, VaultObjectStatus,
};
use crate::validation::{parse_kubernetes_duration, require_non_empty, validate_optional_duration, ValidationError};
use crate::vault::{Payload, VaultError};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;
use vault_paths::builder::VaultPath;
use vault_paths::clean::effective_name;
use vault_paths::errors::PathBuilderError;
use vault_paths::operations::MountKind;

/// Keys accepted by the tune endpoint
const TUNABLE_KEYS: &[&str] = &[
    "description",
    "default_lease_ttl",
    "max_lease_ttl",
    "force_no_cache",
    "audit_non_hmac_request_keys",
    "audit_non_hmac_response_keys",
    "listing_visibility",
    "passthrough_request_headers",
    "allowed_response_headers",
    "options",
];

/// TTLs go over the wire as integer seconds
fn ttl_value(ttl: &str) -> Value {
    match parse_kubernetes_duration(ttl) {
        Ok(duration) => duration.as_secs().into(),
        Err(_) => ttl.into(),
    }
}

fn config_payload(config: &MountConfig) -> Payload {
    let mut payload = Payload::new();
    if let Some(ttl) = &config.default_lease_ttl {
        payload.insert("default_lease_ttl".to_string(), ttl_value(ttl));
    }
    if let Some(ttl) = &config.max_lease_ttl {
        payload.insert("max_lease_ttl".to_string(), ttl_value(ttl));
    }
    if let Some(force_no_cache) = config.force_no_cache {
        payload.insert("force_no_cache".to_string(), force_no_cache.into());
    }
    put_list(&mut payload, "audit_non_hmac_request_keys", &config.audit_non_hmac_request_keys);
    put_list(&mut payload, "audit_non_hmac_response_keys", &config.audit_non_hmac_response_keys);
    put_str(&mut payload, "listing_visibility", config.listing_visibility.as_deref());
    put_list(&mut payload, "passthrough_request_headers", &config.passthrough_request_headers);
    put_list(&mut payload, "allowed_response_headers", &config.allowed_response_headers);
    payload
}

fn options_value(mount: &MountDefinition) -> Option<Value> {
    if mount.options.is_empty() {
        return None;
    }
    serde_json::to_value(&mount.options).ok()
}

/// Body for the initial mount request
#[must_use]
pub fn mount_payload(mount: &MountDefinition) -> Payload {
    let mut payload = Payload::new();
    payload.insert("type".to_string(), mount.engine_type.clone().into());
    put_str(&mut payload, "description", mount.description.as_deref());
    payload.insert("config".to_string(), Value::Object(config_payload(&mount.config)));
    payload.insert("local".to_string(), mount.local.into());
    payload.insert("seal_wrap".to_string(), mount.seal_wrap.into());
    if let Some(options) = options_value(mount) {
        payload.insert("options".to_string(), options);
    }
    payload
}

/// Body for `<mount>/tune`; also what a tune read is compared against
#[must_use]
pub fn tune_payload(mount: &MountDefinition) -> Payload {
    let mut payload = config_payload(&mount.config);
    put_str(&mut payload, "description", mount.description.as_deref());
    if let Some(options) = options_value(mount) {
        payload.insert("options".to_string(), options);
    }
    payload
}

fn mount_vault_path(
    kind: MountKind,
    mount: &MountDefinition,
    object_name: &str,
) -> Result<String, PathBuilderError> {
    VaultPath::new()
        .segment(kind.mount_path(&mount.path, ""))
        .name(mount.name.as_deref(), object_name)
        .require_name()
        .build()
}

fn mount_tune_path(kind: MountKind, mount: &MountDefinition, object_name: &str) -> String {
    kind.tune_path(&mount.path, effective_name(mount.name.as_deref(), object_name))
}

async fn read_mount(
    kind: MountKind,
    mount: &MountDefinition,
    object_name: &str,
    ctx: &PrepareContext<'_>,
) -> Result<Option<Payload>, VaultError> {
    let key = MountKind::table_key(&mount.path, effective_name(mount.name.as_deref(), object_name));
    let mounted = ctx
        .vault
        .read(ctx.session, kind.table())
        .await?
        .is_some_and(|table| table.contains_key(&key));
    if !mounted {
        return Ok(None);
    }
    ctx.vault
        .read(ctx.session, &mount_tune_path(kind, mount, object_name))
        .await
}

fn validate_mount(mount: &MountDefinition) -> Result<(), ValidationError> {
    require_non_empty("spec.type", &mount.engine_type)?;
    validate_optional_duration("spec.config.defaultLeaseTtl", mount.config.default_lease_ttl.as_deref())?;
    validate_optional_duration("spec.config.maxLeaseTtl", mount.config.max_lease_ttl.as_deref())
}

#[async_trait]
impl VaultObject for SecretEngineMount {
    fn connection(&self) -> Option<&VaultConnection> {
        self.spec.connection.as_ref()
    }

    fn authentication(&self) -> &KubeAuthConfiguration {
        &self.spec.authentication
    }

    fn vault_path(&self) -> Result<String, PathBuilderError> {
        mount_vault_path(MountKind::Secret, &self.spec.mount, &self.name_any())
    }

    fn payload(&self, _internal: &InternalValues) -> Payload {
        let mut payload = mount_payload(&self.spec.mount);
        payload.insert(
            "external_entropy_access".to_string(),
            self.spec.external_entropy_access.into(),
        );
        payload
    }

    fn status(&self) -> Option<&VaultObjectStatus> {
        self.status.as_ref()
    }

    fn read_path(&self) -> String {
        mount_tune_path(MountKind::Secret, &self.spec.mount, &self.name_any())
    }

    async fn read_observed(&self, ctx: &PrepareContext<'_>) -> Result<Option<Payload>, VaultError> {
        read_mount(MountKind::Secret, &self.spec.mount, &self.name_any(), ctx).await
    }

    fn update_request(&self, internal: &InternalValues) -> (String, Payload) {
        (self.read_path(), self.desired_state(internal))
    }

    fn desired_state(&self, _internal: &InternalValues) -> Payload {
        tune_payload(&self.spec.mount)
    }

    fn comparison(&self) -> Comparison {
        Comparison::Keys(TUNABLE_KEYS)
    }

    fn is_valid(&self) -> Result<(), ValidationError> {
        self.vault_path()?;
        validate_mount(&self.spec.mount)
    }
}

#[async_trait]
impl VaultObject for AuthEngineMount {
    fn connection(&self) -> Option<&VaultConnection> {
        self.spec.connection.as_ref()
    }

    fn authentication(&self) -> &KubeAuthConfiguration {
        &self.spec.authentication
    }

    fn vault_path(&self) -> Result<String, PathBuilderError> {
        mount_vault_path(MountKind::Auth, &self.spec.mount, &self.name_any())
    }

    fn payload(&self, _internal: &InternalValues) -> Payload {
        mount_payload(&self.spec.mount)
    }

    fn status(&self) -> Option<&VaultObjectStatus> {
        self.status.as_ref()
    }

    fn read_path(&self) -> String {
        mount_tune_path(MountKind::Auth, &self.spec.mount, &self.name_any())
    }

    async fn read_observed(&self, ctx: &PrepareContext<'_>) -> Result<Option<Payload>, VaultError> {
        read_mount(MountKind::Auth, &self.spec.mount, &self.name_any(), ctx).await
    }

    fn update_request(&self, internal: &InternalValues) -> (String, Payload) {
        (self.read_path(), self.desired_state(internal))
    }

    fn desired_state(&self, _internal: &InternalValues) -> Payload {
        tune_payload(&self.spec.mount)
    }

    fn comparison(&self) -> Comparison {
        Comparison::Keys(TUNABLE_KEYS)
    }

    fn is_valid(&self) -> Result<(), ValidationError> {
        self.vault_path()?;
        validate_mount(&self.spec.mount)
    }
}
