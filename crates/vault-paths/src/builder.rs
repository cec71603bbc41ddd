//! VaultPath builder
//!
//! Collects raw segments, applies name precedence and returns a cleansed path.

use crate::clean::{cleanse, effective_name};
use crate::errors::PathBuilderError;

/// Builder for canonical Vault API paths
///
/// # Example
///
/// ```rust
/// use vault_paths::prelude::*;
///
/// let path = VaultPath::new()
///     .segment("database")
///     .segment("config")
///     .name(Some("orders-db"), "db-config")
///     .build()
///     .unwrap();
/// assert_eq!(path, "database/config/orders-db");
/// ```
#[derive(Debug, Clone, Default)]
pub struct VaultPath {
    segments: Vec<String>,
    require_name: bool,
    name_set: bool,
}

impl VaultPath {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw segment. It may itself contain separators.
    #[must_use]
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Append the final name segment, honoring an explicit override.
    #[must_use]
    pub fn name(mut self, override_name: Option<&str>, object_name: &str) -> Self {
        let name = effective_name(override_name, object_name);
        if !name.trim().is_empty() {
            self.name_set = true;
        }
        self.segments.push(name.to_string());
        self
    }

    /// Fail the build if no non-empty name was supplied
    #[must_use]
    pub fn require_name(mut self) -> Self {
        self.require_name = true;
        self
    }

    /// Build the cleansed path
    ///
    /// # Errors
    ///
    /// Returns an error if a required name is missing or nothing remains after cleansing.
    pub fn build(self) -> Result<String, PathBuilderError> {
        if self.require_name && !self.name_set {
            return Err(PathBuilderError::MissingRequiredParameter(
                "name".to_string(),
            ));
        }
        let path = cleanse(&self.segments.join("/"));
        if path.is_empty() {
            return Err(PathBuilderError::EmptyPath);
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_uses_object_name_without_override() {
        let path = VaultPath::new()
            .segment("sys/policies/acl")
            .name(None, "reader")
            .build()
            .unwrap();
        assert_eq!(path, "sys/policies/acl/reader");
    }

    #[test]
    fn test_builder_override_wins() {
        let path = VaultPath::new()
            .segment("/kv//")
            .name(Some("custom"), "reader")
            .build()
            .unwrap();
        assert_eq!(path, "kv/custom");
    }

    #[test]
    fn test_builder_missing_name() {
        let result = VaultPath::new()
            .segment("kv")
            .name(None, "")
            .require_name()
            .build();
        assert_eq!(
            result,
            Err(PathBuilderError::MissingRequiredParameter("name".to_string()))
        );
    }

    #[test]
    fn test_builder_empty_path() {
        assert_eq!(
            VaultPath::new().segment("//").build(),
            Err(PathBuilderError::EmptyPath)
        );
    }
}
