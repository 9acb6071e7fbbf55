//! Content-addressed object storage for Vellum.
//!
//! Every revision of a document is stored as three immutable objects, in the
//! same way git stores a commit:
//!
//! - [`Blob`] -- the canonical bytes of the document content
//! - [`Tree`] -- maps the fixed entry name `content` to that blob
//! - [`CommitObject`] -- tree reference, parent list, author, message, timestamp
//!
//! Objects are keyed by a domain-separated BLAKE3 hash of their bytes, so a
//! write of identical data is a no-op.
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsObjectStore`] -- one file per object under `objects/`
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. The store never deletes objects; pruning is not part of this crate.
//! 3. Reads verify the content address where the backend can be corrupted
//!    from outside the process.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, CommitObject, ObjectKind, StoredObject, Tree, TreeEntry, CONTENT_ENTRY};
pub use traits::ObjectStore;
