//! Versioned documents with a publishing workflow.
//!
//! A [`Document`] keeps every saved version of its content as an immutable
//! [`Revision`] in a per-document [`Repository`]. Named states (`master`,
//! `published`, ...) point at the newest revision of their timeline:
//!
//! - [`Document::save`] appends to `master`, the editing timeline.
//! - [`Document::promote`] copies the tip of one state into another. The new
//!   revision records both the target state's previous tip and the exact
//!   revision it was promoted from.
//! - [`Document::has_been_promoted`] answers whether a given revision ever
//!   reached a state, by walking both kinds of links.
//!
//! Every document shares a single synthetic root revision across all of its
//! states, so each timeline ends at the same, well-known place. The root is
//! never returned by lookups or history.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use vellum_document::{Author, Change, Content, Document, Storage};
//!
//! let storage = Storage::in_memory().unwrap();
//! let mut doc =
//!     Document::with_id(&storage, "intro", "article", Content::from(json!({"title": "A"})))
//!         .unwrap();
//! let author = Author::new("Jane Doe", "jane@example.com");
//!
//! let draft = doc.save(Change::new(author.clone())).unwrap();
//! doc.promote("master", "published", Change::new(author)).unwrap();
//! assert!(doc.has_been_promoted("published", draft.id().as_ref()).unwrap());
//! ```
//!
//! # Modules
//!
//! - [`storage`] / [`config`] -- opening a storage root
//! - [`repository`] -- one document's objects and state pointers
//! - [`revision`] -- revisions and the ancestry search
//! - [`collection`] / [`history`] -- resolving and walking revisions
//! - [`document`] -- the document aggregate
//! - [`index`] -- the shared list of documents
//! - [`indexer`] -- the boundary to an external search indexer

pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod index;
pub mod indexer;
pub mod repository;
pub mod revision;
pub mod storage;

pub use collection::RevisionCollection;
pub use config::{Backend, StorageConfig};
pub use document::{Document, MASTER};
pub use error::{DocumentError, DocumentResult};
pub use history::History;
pub use index::{DocumentIndex, IndexEntry};
pub use indexer::{Indexer, IndexerError, NoopIndexer, RevisionEvent};
pub use repository::{Repository, ROOT_TAG};
pub use revision::{Change, Direction, NewRevision, PointerUpdate, Revision, RevisionKind};
pub use storage::Storage;

pub use vellum_types::{Author, Content, DocumentId, DocumentType, ObjectId, Scalar};
