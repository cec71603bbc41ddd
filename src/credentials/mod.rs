//! # Credential Resolution
//!
//! Turns a [`CredentialReference`] from a resource spec into an
//! `(identity, secret)` pair. Exactly one of three sources may be named:
//!
//! - a local Kubernetes secret
//! - a secret stored in Vault itself
//! - a `RandomSecret` whose generated value lives in Vault
//!
//! Resolution happens on every pass and is never cached.

mod error;
mod resolver;

pub use error::CredentialError;
pub use resolver::{CredentialResolver, ResolveScope};

use crate::crd::CredentialReference;
use zeroize::Zeroizing;

/// The single source a [`CredentialReference`] points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    LocalSecret { name: String },
    RemoteSecret { path: String },
    GeneratedSecret { name: String },
}

impl CredentialSource {
    /// Convert the spec form into the tagged form.
    ///
    /// Returns `Ok(None)` when no source is set and fails before any
    /// lookup when more than one is.
    ///
    /// # Errors
    ///
    /// [`CredentialError::Ambiguous`] if two or more sources are set.
    pub fn from_reference(reference: &CredentialReference) -> Result<Option<Self>, CredentialError> {
        let sources = reference.sources_set();
        if sources.len() > 1 {
            return Err(CredentialError::Ambiguous { sources });
        }
        Ok(match reference {
            CredentialReference {
                secret: Some(name), ..
            } => Some(CredentialSource::LocalSecret { name: name.clone() }),
            CredentialReference {
                vault_secret: Some(path),
                ..
            } => Some(CredentialSource::RemoteSecret { path: path.clone() }),
            CredentialReference {
                random_secret: Some(name),
                ..
            } => Some(CredentialSource::GeneratedSecret { name: name.clone() }),
            _ => None,
        })
    }

    /// Label used in logs and metrics
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialSource::LocalSecret { .. } => "local_secret",
            CredentialSource::RemoteSecret { .. } => "remote_secret",
            CredentialSource::GeneratedSecret { .. } => "generated_secret",
        }
    }
}

/// Per-kind default key names and whether zero sources is acceptable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialDefaults {
    pub username_key: &'static str,
    pub password_key: &'static str,
    /// Zero sources means "no credential" instead of an error
    pub implicit_default: bool,
}

impl CredentialDefaults {
    /// `username`/`password`, a source is required
    pub const REQUIRED: Self = Self {
        username_key: "username",
        password_key: "password",
        implicit_default: false,
    };

    /// `username`/`password`, no source means no credential
    pub const OPTIONAL: Self = Self {
        username_key: "username",
        password_key: "password",
        implicit_default: true,
    };
}

/// A resolved `(identity, secret)` pair. Lives for one pass only.
pub struct ResolvedCredential {
    pub identity: String,
    secret: Zeroizing<String>,
}

impl ResolvedCredential {
    #[must_use]
    pub fn new(identity: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("identity", &self.identity)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_source() {
        let source =
            CredentialSource::from_reference(&CredentialReference::local_secret("db-root"))
                .unwrap();
        assert_eq!(
            source,
            Some(CredentialSource::LocalSecret {
                name: "db-root".to_string()
            })
        );
    }

    #[test]
    fn test_no_source() {
        let source = CredentialSource::from_reference(&CredentialReference::default()).unwrap();
        assert_eq!(source, None);
    }

    #[test]
    fn test_ambiguous_sources_listed() {
        let reference = CredentialReference {
            secret: Some("a".to_string()),
            random_secret: Some("b".to_string()),
            ..CredentialReference::default()
        };
        match CredentialSource::from_reference(&reference) {
            Err(CredentialError::Ambiguous { sources }) => {
                assert_eq!(sources, vec!["secret", "randomSecret"]);
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let credential = ResolvedCredential::new("admin", "s3cret");
        let rendered = format!("{credential:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("s3cret"));
    }
}
