//! Vault API error classification

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("nothing found at {path}")]
    NotFound { path: String },

    #[error("permission denied for {path}: {message}")]
    PermissionDenied { path: String, message: String },

    #[error("vault returned {status} for {path}: {message}")]
    Api {
        status: u16,
        path: String,
        message: String,
    },

    #[error("vault unavailable ({status}) for {path}: {message}")]
    Unavailable {
        status: u16,
        path: String,
        message: String,
    },

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {path}: {message}")]
    Decode { path: String, message: String },

    #[error("invalid vault connection: {0}")]
    InvalidTarget(String),

    #[error("login at {path} returned no client token")]
    MissingToken { path: String },
}

impl VaultError {
    /// Classify a non-success HTTP status
    #[must_use]
    pub fn from_status(status: u16, path: &str, body: &str) -> Self {
        let message = error_message(body);
        let path = path.to_string();
        match status {
            404 => VaultError::NotFound { path },
            401 | 403 => VaultError::PermissionDenied { path, message },
            429 | 500..=599 => VaultError::Unavailable {
                status,
                path,
                message,
            },
            _ => VaultError::Api {
                status,
                path,
                message,
            },
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, VaultError::NotFound { .. })
    }

    /// Short label for metrics
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            VaultError::NotFound { .. } => "not_found",
            VaultError::PermissionDenied { .. } => "permission_denied",
            VaultError::Api { .. } => "api",
            VaultError::Unavailable { .. } => "unavailable",
            VaultError::Transport { .. } => "transport",
            VaultError::Decode { .. } => "decode",
            VaultError::InvalidTarget(_) => "invalid_target",
            VaultError::MissingToken { .. } => "missing_token",
        }
    }
}

/// Vault reports failures as `{"errors": ["..."]}`
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value.get("errors").and_then(|errors| errors.as_array()).map(|errors| {
                errors
                    .iter()
                    .filter_map(|e| e.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            })
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(VaultError::from_status(404, "kv/a", "").is_not_found());
        assert!(matches!(
            VaultError::from_status(403, "kv/a", r#"{"errors":["permission denied"]}"#),
            VaultError::PermissionDenied { ref message, .. } if message == "permission denied"
        ));
        assert!(matches!(
            VaultError::from_status(503, "kv/a", "sealed"),
            VaultError::Unavailable { status: 503, .. }
        ));
        assert!(matches!(
            VaultError::from_status(400, "kv/a", r#"{"errors":["a","b"]}"#),
            VaultError::Api { ref message, .. } if message == "a; b"
        ));
    }
}
