//! Boundary to an external search indexer.
//!
//! Documents report every save and promotion to an [`Indexer`] after the
//! revision is visible. Indexers only observe; they cannot change documents.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use vellum_types::{Author, DocumentId, DocumentType, ObjectId};

use crate::revision::RevisionKind;

/// A revision that just became visible in a state.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RevisionEvent {
    pub document: DocumentId,
    pub doc_type: DocumentType,
    pub revision: ObjectId,
    pub kind: RevisionKind,
    /// State the revision was written into.
    pub state: String,
    /// Source state of a promotion.
    pub from: Option<String>,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    /// Plain projection of the revision content.
    pub content: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("indexer unavailable: {0}")]
    Unavailable(String),

    #[error("indexer rejected revision: {0}")]
    Rejected(String),
}

/// Receives revision events. Failures are logged by the caller and never
/// undo the revision.
pub trait Indexer: Send + Sync {
    fn index(&self, event: &RevisionEvent) -> Result<(), IndexerError>;
}

/// Indexer that ignores every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopIndexer;

impl Indexer for NoopIndexer {
    fn index(&self, _event: &RevisionEvent) -> Result<(), IndexerError> {
        Ok(())
    }
}
