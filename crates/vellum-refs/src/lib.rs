//! Reference management for Vellum documents.
//!
//! References are the mutable, human-readable entry points into a document's
//! immutable revision graph, analogous to git refs.
//!
//! # Architecture
//!
//! - **States** (`refs/heads/*`) are mutable pointers to the tip revision of
//!   a workflow state such as `master` or `published`. They move only through
//!   compare-and-swap updates, so two writers racing on the same state cannot
//!   silently lose a revision.
//! - **Tags** (`refs/tags/*`) are immutable pointers. Every document carries
//!   one, `refs/tags/root`, naming its synthetic root revision.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- The [`Ref`] type
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`names`] -- State/tag name validation
//! - [`memory`] -- In-memory [`InMemoryRefStore`]
//! - [`fs`] -- File-per-ref [`FsRefStore`]

pub mod error;
pub mod fs;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, Result};
pub use fs::FsRefStore;
pub use memory::InMemoryRefStore;
pub use names::{validate_state_name, validate_tag_name};
pub use traits::RefStore;
pub use types::{Ref, STATE_PREFIX, TAG_PREFIX};
