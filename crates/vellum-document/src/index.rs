//! The document index: a flat manifest of every document in a storage root.
//!
//! The manifest is a JSON array of `{name, type}` entries stored as one blob
//! in its own repository. Each new registration writes a fresh blob and moves
//! the `master` pointer to it.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use vellum_store::Blob;
use vellum_types::ObjectId;

use crate::error::{DocumentError, DocumentResult};
use crate::repository::Repository;

const INDEX_STATE: &str = "master";

/// A lost race on the manifest pointer is re-applied on top of the winner's
/// manifest at most this many times.
const REGISTER_ATTEMPTS: usize = 3;

/// One listed document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

impl IndexEntry {
    /// An entry for document `name` of type `doc_type`.
    pub fn new(name: impl Into<String>, doc_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc_type: doc_type.into(),
        }
    }
}

struct Manifest {
    blob: ObjectId,
    entries: Vec<IndexEntry>,
}

/// Insertion-ordered list of `(name, type)` pairs.
pub struct DocumentIndex {
    repo: Arc<Repository>,
    cache: RwLock<Option<Manifest>>,
}

impl DocumentIndex {
    /// An index kept in `repo`.
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            repo,
            cache: RwLock::new(None),
        }
    }

    /// Every registered document, oldest first. Empty if nothing was ever
    /// registered.
    pub fn list_all(&self) -> DocumentResult<Vec<IndexEntry>> {
        match self.repo.state_target(INDEX_STATE)? {
            Some(blob) => self.entries_at(blob),
            None => Ok(Vec::new()),
        }
    }

    /// Register a document unless one with the same name is already listed.
    ///
    /// The first entry for a name wins; a later registration with a
    /// different type does not change it. Returns `true` once the document
    /// is listed.
    pub fn register(&self, name: &str, doc_type: &str) -> DocumentResult<bool> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.repo.state_target(INDEX_STATE)?;
            let mut entries = match current {
                Some(blob) => self.entries_at(blob)?,
                None => Vec::new(),
            };
            if entries.iter().any(|e| e.name == name) {
                return Ok(true);
            }

            entries.push(IndexEntry::new(name, doc_type));
            let data = serde_json::to_vec(&entries)
                .map_err(|e| DocumentError::Integrity(format!("encoding index: {e}")))?;
            let blob = self
                .repo
                .object_store()
                .write(&Blob::new(data).to_stored_object())?;

            match self.repo.move_state(INDEX_STATE, current, blob) {
                Ok(()) => {
                    info!(
                        document = %name,
                        doc_type = %doc_type,
                        entries = entries.len(),
                        "registered document"
                    );
                    *self.cache.write().expect("lock poisoned") = Some(Manifest { blob, entries });
                    return Ok(true);
                }
                Err(DocumentError::Conflict(reason)) if attempt < REGISTER_ATTEMPTS => {
                    debug!(
                        document = %name,
                        attempt,
                        %reason,
                        "index moved, retrying registration"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// First entry with the given name. Linear scan.
    pub fn lookup(&self, name: &str) -> DocumentResult<Option<IndexEntry>> {
        Ok(self.list_all()?.into_iter().find(|e| e.name == name))
    }

    /// Whether a document called `name` is registered.
    pub fn contains(&self, name: &str) -> DocumentResult<bool> {
        Ok(self.lookup(name)?.is_some())
    }

    fn entries_at(&self, blob: ObjectId) -> DocumentResult<Vec<IndexEntry>> {
        if let Some(manifest) = self.cache.read().expect("lock poisoned").as_ref() {
            if manifest.blob == blob {
                return Ok(manifest.entries.clone());
            }
        }

        let object = self.repo.read_object(&blob)?;
        let data = Blob::from_stored_object(&object)?.data;
        let entries: Vec<IndexEntry> = serde_json::from_slice(&data)
            .map_err(|e| DocumentError::Integrity(format!("index manifest {blob}: {e}")))?;
        *self.cache.write().expect("lock poisoned") = Some(Manifest {
            blob,
            entries: entries.clone(),
        });
        Ok(entries)
    }
}

impl std::fmt::Debug for DocumentIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentIndex")
            .field("repository", &self.repo.name())
            .finish()
    }
}
