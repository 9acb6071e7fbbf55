//! Content hashing for Vellum.
//!
//! Every object Vellum stores is addressed by a domain-separated BLAKE3 hash
//! of its bytes. Wraps the `blake3` crate; no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
