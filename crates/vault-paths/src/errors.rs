//! Error types for path construction

use std::fmt;

/// Errors that can occur during path construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathBuilderError {
    /// Required parameter is missing
    MissingRequiredParameter(String),

    /// The cleansed path has no segments left
    EmptyPath,
}

impl fmt::Display for PathBuilderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathBuilderError::MissingRequiredParameter(param) => {
                write!(f, "Missing required parameter: {param}")
            }
            PathBuilderError::EmptyPath => write!(f, "Path is empty after cleansing"),
        }
    }
}

impl std::error::Error for PathBuilderError {}
