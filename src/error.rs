//! Error types for the attrisk library.
//!
//! Three families matter to callers:
//! - configuration errors (bad threshold, malformed expected-features file,
//!   missing artifact) are fatal and surface at load time;
//! - validation errors reject a single prediction request;
//! - data errors come from tables that cannot be processed at all.
//!
//! Dirty *values* never produce an error: the cleaning primitives turn them
//! into missing values instead.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for attrisk operations
pub type Result<T> = std::result::Result<T, AttritionError>;

/// Main error type for the attrisk library
#[derive(Error, Debug)]
pub enum AttritionError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    #[error("Invalid expected features file {}: {reason}", path.display())]
    InvalidExpectedFeatures { path: PathBuf, reason: String },

    #[error(
        "Incomplete payload: missing features {missing:?}, null features {nulls:?}"
    )]
    IncompletePayload {
        missing: Vec<String>,
        nulls: Vec<String>,
    },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Column '{0}' has values but none of them is numeric")]
    NonNumericColumn(String),

    #[error("Target column '{column}': {reason}")]
    InvalidTarget { column: String, reason: String },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Model not fitted")]
    NotFitted,

    #[error("Unsupported artifact format version {found} (expected {expected})")]
    ArtifactVersion { found: u32, expected: u32 },

    #[error("Data error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AttritionError {
    /// True for errors that reject one request rather than the whole process.
    pub fn is_validation(&self) -> bool {
        matches!(self, AttritionError::IncompletePayload { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_payload_is_validation() {
        let err = AttritionError::IncompletePayload {
            missing: vec!["age".to_string()],
            nulls: vec![],
        };
        assert!(err.is_validation());
        assert!(err.to_string().contains("age"));
    }

    #[test]
    fn test_artifact_not_found_mentions_path() {
        let err = AttritionError::ArtifactNotFound(PathBuf::from("models/pipeline.json"));
        assert!(!err.is_validation());
        assert!(err.to_string().contains("models/pipeline.json"));
    }
}
