//! Pact contract tests for the Vault HTTP API
//!
//! These tests define the contract between the operator's Vault client and
//! the Vault REST API. Pact provides a mock server that plays Vault; the
//! requests are made by the real `VaultHttpClient`.

mod common;

use common::{init_rustls, payload};
use pact_consumer::prelude::*;
use serde_json::json;
use std::time::Duration;
use vault_config_operator::vault::{
    LoginRequest, VaultClient, VaultError, VaultHttpClient, VaultSession, VaultTarget,
};
use zeroize::Zeroizing;

const CONSUMER: &str = "Vault-Config-Operator";
const PROVIDER: &str = "Vault";

fn target(mock_server: &dyn ValidatingMockServer) -> VaultTarget {
    // mock_server.url() ends with a slash; the client adds `/v1/...`
    let mut address = mock_server.url().to_string();
    if address.ends_with('/') {
        address.pop();
    }
    VaultTarget {
        address,
        namespace: None,
        ca_pem: None,
        skip_verify: false,
    }
}

fn client() -> VaultHttpClient {
    VaultHttpClient::new(Duration::from_secs(5))
}

#[tokio::test]
async fn test_vault_kubernetes_login_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("log in with a service account token", "", |mut i| {
        i.given("the kubernetes auth method is enabled with role operator");
        i.request
            .method("POST")
            .path("/v1/auth/kubernetes/login")
            .header("content-type", "application/json")
            .json_body(json!({"role": "operator", "jwt": "sa-jwt"}));
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "auth": {
                    "client_token": "hvs.operator-token",
                    "lease_duration": 3600,
                    "renewable": true
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let request = LoginRequest {
        mount: "kubernetes".to_string(),
        role: "operator".to_string(),
        jwt: Zeroizing::new("sa-jwt".to_string()),
        namespace: None,
    };

    let session = client()
        .login(&target(mock_server.as_ref()), &request)
        .await
        .expect("login should succeed");

    assert_eq!(session.token(), "hvs.operator-token");
}

#[tokio::test]
async fn test_vault_read_policy_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("read an ACL policy", "", |mut i| {
        i.given("policy reader exists");
        i.request
            .method("GET")
            .path("/v1/sys/policies/acl/reader")
            .header("X-Vault-Token", "hvs.operator-token");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "request_id": "5e2d5f4c",
                "data": {
                    "name": "reader",
                    "policy": "path \"kv/*\" { capabilities = [\"read\"] }"
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let session = VaultSession::new(target(mock_server.as_ref()), "hvs.operator-token");

    let policy = client()
        .read(&session, "sys/policies/acl/reader")
        .await
        .expect("read should succeed")
        .expect("policy should exist");

    assert_eq!(policy["name"], json!("reader"));
}

#[tokio::test]
async fn test_vault_read_missing_path_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("read a path that does not exist", "", |mut i| {
        i.given("nothing is stored at kv/data/missing");
        i.request
            .method("GET")
            .path("/v1/kv/data/missing")
            .header("X-Vault-Token", "hvs.operator-token");
        i.response
            .status(404)
            .header("content-type", "application/json")
            .json_body(json!({"errors": []}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let session = VaultSession::new(target(mock_server.as_ref()), "hvs.operator-token");

    let observed = client()
        .read(&session, "kv/data/missing")
        .await
        .expect("a 404 is not an error on read");

    assert!(observed.is_none());
}

#[tokio::test]
async fn test_vault_write_with_namespace_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("write an ACL policy in a Vault namespace", "", |mut i| {
        i.given("namespace team-a exists");
        i.request
            .method("POST")
            .path("/v1/sys/policies/acl/reader")
            .header("X-Vault-Token", "hvs.operator-token")
            .header("X-Vault-Namespace", "team-a")
            .header("content-type", "application/json")
            .json_body(json!({"policy": "path \"kv/*\" { capabilities = [\"read\"] }"}));
        i.response.status(204);
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let mut vault = target(mock_server.as_ref());
    vault.namespace = Some("team-a".to_string());
    let session = VaultSession::new(vault, "hvs.operator-token");

    let response = client()
        .write(
            &session,
            "sys/policies/acl/reader",
            &payload(json!({"policy": "path \"kv/*\" { capabilities = [\"read\"] }"})),
        )
        .await
        .expect("write should succeed");

    assert!(response.is_none());
}

#[tokio::test]
async fn test_vault_generate_root_returns_data_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("generate an internal root CA", "", |mut i| {
        i.given("a PKI engine is mounted at pki");
        i.request
            .method("POST")
            .path("/v1/pki/root/generate/internal")
            .header("X-Vault-Token", "hvs.operator-token")
            .json_body(json!({"common_name": "Example Root", "exclude_cn_from_sans": false}));
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "data": {
                    "certificate": "-----BEGIN CERTIFICATE-----ROOT",
                    "serial_number": "3a:9f",
                    "expiration": 1_893_456_000
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let session = VaultSession::new(target(mock_server.as_ref()), "hvs.operator-token");

    let response = client()
        .write(
            &session,
            "pki/root/generate/internal",
            &payload(json!({"common_name": "Example Root", "exclude_cn_from_sans": false})),
        )
        .await
        .expect("generate should succeed")
        .expect("generate returns the certificate");

    assert_eq!(response["serial_number"], json!("3a:9f"));
}

#[tokio::test]
async fn test_vault_permission_denied_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new(CONSUMER, PROVIDER);

    pact_builder.interaction("delete a mount without permission", "", |mut i| {
        i.given("the operator token cannot manage mounts");
        i.request
            .method("DELETE")
            .path("/v1/sys/mounts/team-a/kv")
            .header("X-Vault-Token", "hvs.operator-token");
        i.response
            .status(403)
            .header("content-type", "application/json")
            .json_body(json!({"errors": ["1 error occurred:\n\t* permission denied\n\n"]}));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let session = VaultSession::new(target(mock_server.as_ref()), "hvs.operator-token");

    let err = client()
        .delete(&session, "sys/mounts/team-a/kv")
        .await
        .expect_err("403 must surface as an error");

    assert!(matches!(err, VaultError::PermissionDenied { .. }));
}
