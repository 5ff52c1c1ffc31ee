//! Error types for the Scriptflow engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the whole Scriptflow workspace.
///
/// Navigation to an unknown screen is deliberately absent here: it is a
/// silent no-op reported through `NavigationOutcome::Ignored`.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum ScriptflowError {
    /// Source document unreachable or malformed. Fatal to the current load only.
    #[error("Data source error: {0}")]
    DataSource(String),

    /// An action was blocked because its preconditions are not met
    /// (missing selections, unknown product entry, id collision).
    #[error("{0}")]
    Validation(String),

    /// Remote store write/delete failure. Logged, never surfaced to the user.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScriptflowError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a DataSource error
    pub fn data_source(message: impl Into<String>) -> Self {
        Self::DataSource(message.into())
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a DataSource error
    pub fn is_data_source(&self) -> bool {
        matches!(self, Self::DataSource(_))
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Persistence error
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the message should be shown to the operator.
    ///
    /// Persistence failures stay in the logs; everything else is an alert.
    pub fn is_user_visible(&self) -> bool {
        !self.is_persistence()
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ScriptflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ScriptflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ScriptflowError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ScriptflowError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for ScriptflowError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, ScriptflowError>`.
pub type Result<T> = std::result::Result<T, ScriptflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_errors_are_not_user_visible() {
        assert!(!ScriptflowError::persistence("store offline").is_user_visible());
        assert!(ScriptflowError::data_source("bad json").is_user_visible());
        assert!(ScriptflowError::validation("pick a product").is_user_visible());
    }

    #[test]
    fn test_json_error_conversion() {
        let err: ScriptflowError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ScriptflowError::Serialization { ref format, .. } if format == "JSON"));
    }

    #[test]
    fn test_validation_display_is_bare_message() {
        let err = ScriptflowError::validation("Selecione um produto válido para iniciar.");
        assert_eq!(err.to_string(), "Selecione um produto válido para iniciar.");
    }
}
