//! Error types for Affinity operations.
//!
//! Generation logs and aborts on any of these; retrieval degrades to an
//! empty result. Nothing in the core panics on bad input.

use crate::types::{RecommendationEdge, RecordId};
use thiserror::Error;

/// Result type for Affinity operations.
pub type Result<T> = std::result::Result<T, AffinityError>;

/// Errors that can occur while generating or retrieving recommendations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AffinityError {
    /// No recommendation set with this name is configured for the kind.
    #[error("No configuration for recommendation '{name}' on kind '{kind}'")]
    ConfigurationMissing { kind: String, name: String },

    /// A table or column name that cannot be used as an SQL identifier.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// An edge with the same unique key already exists.
    #[error("Duplicate edge: {source_type}/{source_id} -> {target_type}/{target_id} ({recommendation_name})")]
    DuplicateEdge {
        source_type: String,
        source_id: String,
        target_type: String,
        target_id: String,
        recommendation_name: String,
    },

    /// Backend failure (SQLite, lock poisoning, ...).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed configuration document.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O errors (wrapped).
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization errors.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for AffinityError {
    fn from(e: std::io::Error) -> Self {
        AffinityError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AffinityError {
    fn from(e: serde_json::Error) -> Self {
        AffinityError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for AffinityError {
    fn from(e: toml::de::Error) -> Self {
        AffinityError::Config(e.to_string())
    }
}

// Convenience constructors
impl AffinityError {
    pub fn configuration_missing(kind: impl Into<String>, name: impl Into<String>) -> Self {
        AffinityError::ConfigurationMissing {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn storage(msg: impl ToString) -> Self {
        AffinityError::Storage(msg.to_string())
    }

    /// An edge handed to a replace for a different source or set.
    pub fn foreign_edge(
        edge: &RecommendationEdge,
        source_type: &str,
        source_id: &RecordId,
        recommendation_name: &str,
    ) -> Self {
        AffinityError::Storage(format!(
            "edge {}/{} ({}) cannot replace edges of {}/{} ({})",
            edge.source_type,
            edge.source_id,
            edge.recommendation_name,
            source_type,
            source_id,
            recommendation_name
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_missing_names_kind_and_set() {
        let err = AffinityError::configuration_missing("product", "bought_together");
        assert_eq!(
            err.to_string(),
            "No configuration for recommendation 'bought_together' on kind 'product'"
        );
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "records.json");
        let err: AffinityError = io.into();
        assert!(matches!(err, AffinityError::Io(_)));
    }
}
