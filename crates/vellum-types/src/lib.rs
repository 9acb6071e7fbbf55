//! Foundation types for Vellum.
//!
//! This crate provides the identity and structural types shared by every
//! other Vellum crate.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`Author`] -- Name and email attached to every revision
//! - [`Content`] -- Structured document payload (objects, arrays, scalars)
//! - [`DocumentId`] -- Validated document identifier
//! - [`DocumentType`] -- Validated symbolic document type name

pub mod author;
pub mod content;
pub mod error;
pub mod identity;
pub mod object;

pub use author::Author;
pub use content::{Content, Scalar};
pub use error::TypeError;
pub use identity::{DocumentId, DocumentType};
pub use object::ObjectId;
