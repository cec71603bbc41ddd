use crate::store::StoreError;
use crate::vault::VaultError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("multiple credential sources set: {}", sources.join(", "))]
    Ambiguous { sources: Vec<&'static str> },

    #[error("no credential source set and this kind has no implicit default")]
    NoSource,

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("key '{key}' not found in {location}")]
    KeyNotFound { key: String, location: String },

    #[error("key '{key}' in {location} is not valid UTF-8")]
    InvalidEncoding { key: String, location: String },

    #[error("no identity for credential from {location}; set it explicitly on the resource")]
    MissingIdentity { location: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Vault(#[from] VaultError),
}

impl CredentialError {
    /// Lookup failures against reachable backends, as opposed to transport trouble
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CredentialError::NotFound { .. }
                | CredentialError::KeyNotFound { .. }
                | CredentialError::InvalidEncoding { .. }
                | CredentialError::MissingIdentity { .. }
        )
    }

    #[must_use]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, CredentialError::Ambiguous { .. })
    }

    /// The reference itself is wrong; no lookup can succeed until the spec changes
    #[must_use]
    pub fn is_misconfigured(&self) -> bool {
        matches!(self, CredentialError::Ambiguous { .. } | CredentialError::NoSource)
    }
}
