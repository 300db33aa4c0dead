//! Error types for the Working Backwards Assistant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire application.
///
/// Variants follow the failure taxonomy of the system: authorization,
/// not-found, store transport, external service, configuration and
/// validation failures each get their own typed variant so callers can
/// decide whether to retry, surface, or degrade.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum WbaError {
    /// No authenticated user is present for an operation that requires one.
    #[error("Not signed in")]
    Unauthorized,

    /// The authenticated user does not own the referenced resource.
    #[error("Permission denied: {resource} '{id}' belongs to another user")]
    PermissionDenied { resource: String, id: String },

    /// Entity not found error with type information.
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound { entity_type: String, id: String },

    /// Store transport error (the durable backend rejected or timed out
    /// a read/write).
    #[error("Store error: {0}")]
    Store(String),

    /// External service error (suggestion provider failure).
    #[error("External service error: {0}")]
    External(String),

    /// Server/provider configuration error (e.g. missing API credential).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Required user input is missing or malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error (file system operations).
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Internal error (should not happen in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl WbaError {
    /// Creates a NotFound error.
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Creates a PermissionDenied error.
    pub fn permission_denied(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::PermissionDenied {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Creates a Store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Creates an External error.
    pub fn external(message: impl Into<String>) -> Self {
        Self::External(message.into())
    }

    /// Creates a Configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a Validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates an Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is an authorization failure (no user, or wrong owner).
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::PermissionDenied { .. })
    }

    /// Check if this is a store transport error.
    ///
    /// Store errors during autosave are the only class that is retried
    /// automatically (by leaving the synchronizer in the Modified state).
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// A short classification string for HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized | Self::PermissionDenied { .. } => "authorization",
            Self::NotFound { .. } => "not-found",
            Self::Store(_) => "store",
            Self::External(_) => "external",
            Self::Configuration(_) => "configuration",
            Self::Validation(_) => "validation",
            Self::Io { .. } => "io",
            Self::Serialization { .. } => "serialization",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for WbaError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for WbaError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for WbaError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for WbaError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at infrastructure seams).
impl From<anyhow::Error> for WbaError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, WbaError>`.
pub type Result<T> = std::result::Result<T, WbaError>;
