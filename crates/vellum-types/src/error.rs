use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid document id {id:?}: {reason}")]
    InvalidDocumentId { id: String, reason: String },

    #[error("invalid document type {name:?}: {reason}")]
    InvalidDocumentType { name: String, reason: String },

    #[error("expected {expected} content, found {found}")]
    WrongShape {
        expected: &'static str,
        found: &'static str,
    },

    #[error("index {index} out of bounds for array of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("serialization error: {0}")]
    Serialization(String),
}
