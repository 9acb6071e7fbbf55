//! Error types for reference operations.

use thiserror::Error;
use vellum_types::ObjectId;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference was not found.
    #[error("ref not found: {name}")]
    NotFound { name: String },

    /// A reference with this name already exists.
    #[error("ref already exists: {name}")]
    AlreadyExists { name: String },

    /// A compare-and-swap update found a different target than expected.
    #[error("ref {name} moved: expected {expected}, found {actual}")]
    Conflict {
        name: String,
        expected: ObjectId,
        actual: ObjectId,
    },

    /// The ref name is invalid.
    #[error("invalid ref name: {name}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A tag is immutable and cannot be updated.
    #[error("tag is immutable: {name}")]
    TagImmutable { name: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error during file-based ref operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for ref operations.
pub type Result<T> = std::result::Result<T, RefError>;
