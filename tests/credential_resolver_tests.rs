//! Credential resolution against in-memory Kubernetes and Vault backends

mod common;

use common::{resource, Call, FakeStore, FakeVault};
use serde_json::json;
use vault_config_operator::clients::Clients;
use vault_config_operator::credentials::{
    CredentialDefaults, CredentialError, CredentialResolver, ResolveScope,
};
use vault_config_operator::crd::{CredentialReference, RandomSecret};
use vault_config_operator::vault::{VaultSession, VaultTarget};

fn session() -> VaultSession {
    VaultSession::new(
        VaultTarget {
            address: "http://vault:8200".to_string(),
            namespace: None,
            ca_pem: None,
            skip_verify: false,
        },
        "test-token",
    )
}

struct Fixture {
    store: std::sync::Arc<FakeStore>,
    vault: std::sync::Arc<FakeVault>,
    resolver: CredentialResolver,
}

fn fixture() -> Fixture {
    let store = FakeStore::new();
    let vault = FakeVault::new();
    let resolver = CredentialResolver::new(Clients::new(store.clone(), vault.clone()));
    Fixture {
        store,
        vault,
        resolver,
    }
}

fn random_secret(name: &str) -> RandomSecret {
    resource(
        "RandomSecret",
        name,
        json!({
            "authentication": {"role": "operator"},
            "path": "kv",
            "secretKey": "password",
            "secretFormat": {"passwordPolicyName": "simple"},
            "kvSecretEngineV2": true
        }),
    )
}

#[tokio::test]
async fn test_local_secret_with_custom_keys() {
    let f = fixture();
    f.store
        .put_secret("team-a", "db-root", &[("user", "admin"), ("pass", "s3cret")]);
    let reference = CredentialReference {
        username_key: Some("user".to_string()),
        password_key: Some("pass".to_string()),
        ..CredentialReference::local_secret("db-root")
    };
    let session = session();
    let scope = ResolveScope {
        namespace: "team-a",
        session: &session,
    };

    let credential = f
        .resolver
        .resolve(scope, &reference, None, CredentialDefaults::REQUIRED)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(credential.identity, "admin");
    assert_eq!(credential.secret(), "s3cret");
    assert!(f.vault.calls().is_empty());
}

#[tokio::test]
async fn test_identity_override_wins_over_stored_username() {
    let f = fixture();
    f.store
        .put_secret("team-a", "db-root", &[("username", "stored"), ("password", "pw")]);
    let session = session();
    let scope = ResolveScope {
        namespace: "team-a",
        session: &session,
    };

    let credential = f
        .resolver
        .resolve(
            scope,
            &CredentialReference::local_secret("db-root"),
            Some("vault-admin"),
            CredentialDefaults::REQUIRED,
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(credential.identity, "vault-admin");
    assert_eq!(credential.secret(), "pw");
}

#[tokio::test]
async fn test_ambiguous_reference_rejected_before_lookup() {
    let f = fixture();
    f.store.put_secret("team-a", "db-root", &[("password", "pw")]);
    let reference = CredentialReference {
        vault_secret: Some("kv/data/db-root".to_string()),
        ..CredentialReference::local_secret("db-root")
    };
    let session = session();
    let scope = ResolveScope {
        namespace: "team-a",
        session: &session,
    };

    let err = f
        .resolver
        .resolve(scope, &reference, None, CredentialDefaults::REQUIRED)
        .await
        .unwrap_err();

    assert!(err.is_ambiguous());
    assert_eq!(f.store.lookups(), 0);
    assert!(f.vault.calls().is_empty());
}

#[tokio::test]
async fn test_no_source_depends_on_kind_defaults() {
    let f = fixture();
    let session = session();
    let scope = ResolveScope {
        namespace: "team-a",
        session: &session,
    };
    let empty = CredentialReference::default();

    let optional = f
        .resolver
        .resolve(scope, &empty, None, CredentialDefaults::OPTIONAL)
        .await
        .unwrap();
    assert!(optional.is_none());

    let required = f
        .resolver
        .resolve(scope, &empty, None, CredentialDefaults::REQUIRED)
        .await
        .unwrap_err();
    assert!(matches!(required, CredentialError::NoSource));
}

#[tokio::test]
async fn test_missing_secret_and_key() {
    let f = fixture();
    f.store.put_secret("team-a", "partial", &[("username", "admin")]);
    let session = session();
    let scope = ResolveScope {
        namespace: "team-a",
        session: &session,
    };

    let missing = f
        .resolver
        .resolve(
            scope,
            &CredentialReference::local_secret("nope"),
            None,
            CredentialDefaults::REQUIRED,
        )
        .await
        .unwrap_err();
    assert!(matches!(missing, CredentialError::NotFound { .. }));

    let no_key = f
        .resolver
        .resolve(
            scope,
            &CredentialReference::local_secret("partial"),
            None,
            CredentialDefaults::REQUIRED,
        )
        .await
        .unwrap_err();
    match no_key {
        CredentialError::KeyNotFound { key, .. } => assert_eq!(key, "password"),
        other => panic!("expected KeyNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remote_secret_unwraps_kv_v2() {
    let f = fixture();
    f.vault.seed(
        "kv/data/ldap-bind",
        json!({
            "data": {"username": "cn=bind,dc=corp", "password": "bindpw"},
            "metadata": {"version": 3}
        }),
    );
    let session = session();
    let scope = ResolveScope {
        namespace: "team-a",
        session: &session,
    };

    let credential = f
        .resolver
        .resolve(
            scope,
            &CredentialReference::vault_secret("kv/data/ldap-bind"),
            None,
            CredentialDefaults::OPTIONAL,
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(credential.identity, "cn=bind,dc=corp");
    assert_eq!(credential.secret(), "bindpw");
    assert_eq!(f.vault.calls(), vec![Call::Read("kv/data/ldap-bind".to_string())]);
}

#[tokio::test]
async fn test_random_secret_needs_identity() {
    let f = fixture();
    f.store.put_random_secret("team-a", random_secret("orders-db-root"));
    f.vault.seed(
        "kv/data/orders-db-root",
        json!({"data": {"password": "g3nerated"}, "metadata": {"version": 1}}),
    );
    let session = session();
    let scope = ResolveScope {
        namespace: "team-a",
        session: &session,
    };
    let reference = CredentialReference::random_secret("orders-db-root");

    let credential = f
        .resolver
        .resolve(scope, &reference, Some("postgres"), CredentialDefaults::REQUIRED)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(credential.identity, "postgres");
    assert_eq!(credential.secret(), "g3nerated");

    let err = f
        .resolver
        .resolve(scope, &reference, None, CredentialDefaults::REQUIRED)
        .await
        .unwrap_err();
    assert!(matches!(err, CredentialError::MissingIdentity { .. }));
}

#[tokio::test]
async fn test_random_secret_not_yet_written() {
    let f = fixture();
    f.store.put_random_secret("team-a", random_secret("orders-db-root"));
    let session = session();
    let scope = ResolveScope {
        namespace: "team-a",
        session: &session,
    };

    let err = f
        .resolver
        .resolve(
            scope,
            &CredentialReference::random_secret("orders-db-root"),
            Some("postgres"),
            CredentialDefaults::REQUIRED,
        )
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}
