//! # Finalizer
//!
//! The finalizer keeps a resource around until its Vault configuration has
//! been removed. Added on the first pass, removed once cleanup succeeds.
//! Status writes live here too since they are the other metadata patch a
//! pass makes.

use crate::constants::{FIELD_MANAGER, FINALIZER};
use kube::api::{Api, Patch, PatchParams};
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::info;

/// Finalizer list with ours appended, or `None` if already present
#[must_use]
pub fn with_finalizer(current: &[String]) -> Option<Vec<String>> {
    if current.iter().any(|f| f == FINALIZER) {
        return None;
    }
    let mut finalizers = current.to_vec();
    finalizers.push(FINALIZER.to_string());
    Some(finalizers)
}

/// Finalizer list without ours, or `None` if it was not there
#[must_use]
pub fn without_finalizer(current: &[String]) -> Option<Vec<String>> {
    if !current.iter().any(|f| f == FINALIZER) {
        return None;
    }
    Some(
        current
            .iter()
            .filter(|f| *f != FINALIZER)
            .cloned()
            .collect(),
    )
}

async fn patch_finalizers<K>(api: &Api<K>, obj: &K, finalizers: Vec<String>) -> Result<(), kube::Error>
where
    K: Resource + Clone + DeserializeOwned + std::fmt::Debug,
{
    let patch = json!({"metadata": {"finalizers": finalizers}});
    api.patch(&obj.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

/// # Errors
///
/// Kubernetes patch failures.
pub async fn add_finalizer<K>(api: &Api<K>, obj: &K) -> Result<(), kube::Error>
where
    K: Resource + Clone + DeserializeOwned + std::fmt::Debug,
{
    if let Some(finalizers) = with_finalizer(obj.finalizers()) {
        info!("Adding finalizer to {}", obj.name_any());
        patch_finalizers(api, obj, finalizers).await?;
    }
    Ok(())
}

/// # Errors
///
/// Kubernetes patch failures. A resource already gone is not an error.
pub async fn remove_finalizer<K>(api: &Api<K>, obj: &K) -> Result<(), kube::Error>
where
    K: Resource + Clone + DeserializeOwned + std::fmt::Debug,
{
    let Some(finalizers) = without_finalizer(obj.finalizers()) else {
        return Ok(());
    };
    info!("Removing finalizer from {}", obj.name_any());
    match patch_finalizers(api, obj, finalizers).await {
        Err(kube::Error::Api(api_err)) if api_err.code == 404 => Ok(()),
        other => other,
    }
}

/// Merge-patch `status` on the status subresource
///
/// # Errors
///
/// Kubernetes patch failures.
pub async fn patch_status<K>(api: &Api<K>, name: &str, status: serde_json::Value) -> Result<(), kube::Error>
where
    K: Resource + Clone + DeserializeOwned + std::fmt::Debug,
{
    let patch = json!({ "status": status });
    api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_finalizer() {
        assert_eq!(
            with_finalizer(&["other.io/keep".to_string()]),
            Some(vec!["other.io/keep".to_string(), FINALIZER.to_string()])
        );
        assert_eq!(with_finalizer(&[FINALIZER.to_string()]), None);
    }

    #[test]
    fn test_without_finalizer_keeps_others() {
        assert_eq!(
            without_finalizer(&["other.io/keep".to_string(), FINALIZER.to_string()]),
            Some(vec!["other.io/keep".to_string()])
        );
        assert_eq!(without_finalizer(&["other.io/keep".to_string()]), None);
    }
}
