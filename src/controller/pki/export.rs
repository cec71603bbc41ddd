//! Companion secret holding material Vault returns only once

use crate::constants::{API_GROUP, EXPORT_SECRET_SUFFIX, FIELD_MANAGER};
use crate::crd::PkiSecretEngineConfig;
use crate::vault::Payload;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::{Resource, ResourceExt};
use serde_json::Value;
use std::collections::BTreeMap;

/// Generate-response fields copied into the companion secret when present
pub const EXPORT_FIELDS: &[&str] = &[
    "certificate",
    "issuing_ca",
    "serial_number",
    "private_key",
    "private_key_type",
    "csr",
    "expiration",
];

#[must_use]
pub fn export_secret_name(pki: &PkiSecretEngineConfig) -> String {
    format!("{}{}", pki.name_any(), EXPORT_SECRET_SUFFIX)
}

fn field_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone().into_bytes()),
        Value::Number(n) => Some(n.to_string().into_bytes()),
        _ => None,
    }
}

/// Immutable secret owned by `pki`, built from a generate response
#[must_use]
pub fn export_secret(pki: &PkiSecretEngineConfig, response: &Payload) -> Secret {
    let data: BTreeMap<String, ByteString> = EXPORT_FIELDS
        .iter()
        .filter_map(|field| {
            response
                .get(*field)
                .and_then(field_bytes)
                .map(|bytes| ((*field).to_string(), ByteString(bytes)))
        })
        .collect();

    let labels = BTreeMap::from([
        (
            "app.kubernetes.io/managed-by".to_string(),
            FIELD_MANAGER.to_string(),
        ),
        (format!("{API_GROUP}/pki"), pki.name_any()),
    ]);

    Secret {
        metadata: ObjectMeta {
            name: Some(export_secret_name(pki)),
            namespace: pki.namespace(),
            labels: Some(labels),
            owner_references: pki.controller_owner_ref(&()).map(|owner| vec![owner]),
            ..ObjectMeta::default()
        },
        immutable: Some(true),
        type_: Some("Opaque".to_string()),
        data: Some(data),
        ..Secret::default()
    }
}
