//! kube-rs backed [`ObjectStore`]

use super::{ObjectStore, SecretData, StoreError};
use crate::crd::{PkiSecretEngineConfig, RandomSecret};
use async_trait::async_trait;
use k8s_openapi::api::authentication::v1::{TokenRequest, TokenRequestSpec};
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
}

impl std::fmt::Debug for KubeObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeObjectStore").finish_non_exhaustive()
    }
}

impl KubeObjectStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn get_namespaced<K>(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>
            + Clone
            + DeserializeOwned
            + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        match api.get(name).await {
            Ok(object) => Ok(Some(object)),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, StoreError> {
        let secret: Option<Secret> = self.get_namespaced(namespace, name).await?;
        Ok(secret.map(|secret| {
            secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()
        }))
    }

    async fn create_secret(&self, secret: Secret) -> Result<(), StoreError> {
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret.metadata.name.clone().unwrap_or_default();
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        match api.create(&PostParams::default(), &secret).await {
            Ok(_) => {
                debug!("Created secret {}/{}", namespace, name);
                Ok(())
            }
            Err(kube::Error::Api(api_err)) if api_err.code == 409 => {
                Err(StoreError::AlreadyExists {
                    kind: "Secret",
                    namespace,
                    name,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_secret(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_random_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<RandomSecret>, StoreError> {
        self.get_namespaced(namespace, name).await
    }

    async fn get_pki_config(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PkiSecretEngineConfig>, StoreError> {
        self.get_namespaced(namespace, name).await
    }

    async fn service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
        audiences: &[String],
        ttl_secs: i64,
    ) -> Result<Zeroizing<String>, StoreError> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        let request = TokenRequest {
            spec: TokenRequestSpec {
                audiences: audiences.to_vec(),
                expiration_seconds: Some(ttl_secs),
                ..TokenRequestSpec::default()
            },
            ..TokenRequest::default()
        };
        let response: TokenRequest = api
            .create_subresource(
                "token",
                service_account,
                &PostParams::default(),
                serde_json::to_vec(&request)?,
            )
            .await?;
        response
            .status
            .map(|status| Zeroizing::new(status.token))
            .filter(|token| !token.is_empty())
            .ok_or_else(|| StoreError::MissingToken {
                namespace: namespace.to_string(),
                name: service_account.to_string(),
            })
    }
}
