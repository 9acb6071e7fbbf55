use thiserror::Error;
use vellum_refs::RefError;
use vellum_store::StoreError;
use vellum_types::TypeError;

/// Errors surfaced by document operations.
///
/// Missing state names are not errors: lookups return `None` for a state
/// that has never been written. A pointer that names an object the store
/// does not hold is reported as [`DocumentError::NotFound`].
#[derive(Debug, Error)]
pub enum DocumentError {
    /// An object or ref that must exist does not.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed document id, type or state name. Nothing was written.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation precondition does not hold.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Stored data fails to decode or to match its content address.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// A state pointer moved underneath this operation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Configuration could not be read or parsed.
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("ref error: {0}")]
    Ref(RefError),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

impl From<StoreError> for DocumentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(format!("object {id}")),
            StoreError::HashMismatch { .. } | StoreError::CorruptObject { .. } => {
                Self::Integrity(err.to_string())
            }
            other => Self::Store(other),
        }
    }
}

impl From<RefError> for DocumentError {
    fn from(err: RefError) -> Self {
        match err {
            RefError::NotFound { name } => Self::NotFound(format!("ref {name}")),
            RefError::Conflict { .. } | RefError::AlreadyExists { .. } => {
                Self::Conflict(err.to_string())
            }
            RefError::InvalidName { .. } => Self::InvalidArgument(err.to_string()),
            other => Self::Ref(other),
        }
    }
}

impl From<TypeError> for DocumentError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidDocumentId { .. } | TypeError::InvalidDocumentType { .. } => {
                Self::InvalidArgument(err.to_string())
            }
            TypeError::Serialization(_)
            | TypeError::InvalidHex(_)
            | TypeError::InvalidLength { .. } => Self::Integrity(err.to_string()),
            TypeError::WrongShape { .. } | TypeError::IndexOutOfBounds { .. } => {
                Self::InvalidArgument(err.to_string())
            }
        }
    }
}
