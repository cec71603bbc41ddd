//! # Validation
//!
//! Structural checks run before a pass touches Vault. A failure leaves the
//! resource `Unvalidated` and is not retried until the spec changes.

mod duration;

pub use duration::parse_kubernetes_duration;

use thiserror::Error;
use vault_paths::errors::PathBuilderError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },

    #[error("{field} is immutable after creation (was '{was}', now '{now}')")]
    Immutable {
        field: String,
        was: String,
        now: String,
    },

    #[error("invalid path: {0}")]
    Path(#[from] PathBuilderError),
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Reject empty or whitespace-only required fields
///
/// # Errors
///
/// [`ValidationError::Invalid`] naming `field`.
pub fn require_non_empty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::invalid(field, "must not be empty"));
    }
    Ok(())
}

/// Validate an optional duration string
///
/// # Errors
///
/// [`ValidationError::Invalid`] if the value does not parse.
pub fn validate_optional_duration(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value {
        Some(value) => parse_kubernetes_duration(value)
            .map(|_| ())
            .map_err(|e| ValidationError::invalid(field, e.to_string())),
        None => Ok(()),
    }
}
