//! Explicit dependencies handed to the engine and the credential resolver

use crate::store::ObjectStore;
use crate::vault::VaultClient;
use std::sync::Arc;

/// The two external collaborators every reconciliation pass needs
#[derive(Clone)]
pub struct Clients {
    pub store: Arc<dyn ObjectStore>,
    pub vault: Arc<dyn VaultClient>,
}

impl Clients {
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, vault: Arc<dyn VaultClient>) -> Self {
        Self { store, vault }
    }
}

impl std::fmt::Debug for Clients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clients").finish_non_exhaustive()
    }
}
