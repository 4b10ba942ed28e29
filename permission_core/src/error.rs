//! Error types for permission resolution.
//!
//! Permission checks are boolean, so "denied" is never an error. Errors
//! are reserved for conditions a caller must fix: a misconfigured logic, a
//! relation path that does not exist, a malformed permission string.

use thiserror::Error;

/// Root error type for permission resolution.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("Invalid permission string: {0}")]
    InvalidPermission(String),

    #[error("Permission denied: {permission}")]
    PermissionDenied { permission: String },

    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Settings error: {0}")]
    Settings(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while walking a relation path.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("Lookup path is empty")]
    EmptyPath,

    #[error("Lookup path contains an empty segment: {0:?}")]
    EmptySegment(String),

    #[error("{target} has no attribute {attribute:?}")]
    AttributeResolution { target: String, attribute: String },

    #[error("Relation access failed: {0}")]
    Relation(String),
}

impl Error {
    /// Whether this error is an unresolvable attribute in a lookup path.
    pub fn is_attribute_resolution(&self) -> bool {
        matches!(self, Self::Lookup(LookupError::AttributeResolution { .. }))
    }

    /// Whether this error is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
