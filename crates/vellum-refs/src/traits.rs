//! The [`RefStore`] trait defining the reference storage interface.

use vellum_types::ObjectId;

use crate::error::{RefError, Result};
use crate::types::{Ref, STATE_PREFIX, TAG_PREFIX};

/// Storage backend for named references.
///
/// Implementations must be thread-safe (`Send + Sync`). Every mutation of an
/// existing state ref goes through [`RefStore::update_ref`], which only
/// succeeds when the ref still points where the caller last saw it.
///
/// - `refs/heads/*` for workflow states
/// - `refs/tags/*` for tags
pub trait RefStore: Send + Sync {
    /// Read a ref by its canonical name (e.g. "refs/heads/master").
    ///
    /// Returns `Ok(None)` if the ref does not exist.
    fn read_ref(&self, name: &str) -> Result<Option<Ref>>;

    /// Create a ref at its canonical name.
    ///
    /// Fails with [`RefError::AlreadyExists`] if anything already lives there.
    fn create_ref(&self, reference: &Ref) -> Result<()>;

    /// Compare-and-swap a state ref from `expected` to `target`.
    ///
    /// Fails with [`RefError::NotFound`] if the ref does not exist,
    /// [`RefError::Conflict`] if it no longer points at `expected`, and
    /// [`RefError::TagImmutable`] for tags.
    fn update_ref(&self, name: &str, expected: &ObjectId, target: ObjectId) -> Result<Ref>;

    /// Write a ref unconditionally, as when restoring a backup.
    ///
    /// Re-writing a tag with its existing target is allowed; moving it is not.
    fn restore_ref(&self, reference: &Ref) -> Result<()>;

    /// Delete a ref by canonical name.
    ///
    /// Returns `Ok(true)` if the ref existed and was deleted, `Ok(false)` if
    /// it did not exist.
    fn delete_ref(&self, name: &str) -> Result<bool>;

    /// List all refs whose canonical name starts with `prefix`, sorted by name.
    ///
    /// Pass `""` to list all refs.
    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>>;

    /// The target of a ref, if it exists.
    fn resolve(&self, name: &str) -> Result<Option<ObjectId>> {
        Ok(self.read_ref(name)?.map(|r| r.target()))
    }

    /// List all state refs.
    fn states(&self) -> Result<Vec<(String, Ref)>> {
        self.list_refs(STATE_PREFIX)
    }

    /// List all tag refs.
    fn tags(&self) -> Result<Vec<(String, Ref)>> {
        self.list_refs(TAG_PREFIX)
    }
}

/// Decide the outcome of a compare-and-swap against the ref currently stored.
///
/// Shared by every backend so that they agree on error precedence.
pub(crate) fn checked_update(
    name: &str,
    current: Option<&Ref>,
    expected: &ObjectId,
    target: ObjectId,
) -> Result<Ref> {
    let current = current.ok_or_else(|| RefError::NotFound {
        name: name.to_string(),
    })?;
    if current.is_tag() {
        return Err(RefError::TagImmutable {
            name: name.to_string(),
        });
    }
    if current.target() != *expected {
        return Err(RefError::Conflict {
            name: name.to_string(),
            expected: *expected,
            actual: current.target(),
        });
    }
    Ok(current.retarget(target))
}

/// Reject restores that would move an existing tag.
pub(crate) fn checked_restore(current: Option<&Ref>, reference: &Ref) -> Result<()> {
    if let Some(existing) = current {
        if existing.is_tag() && existing.target() != reference.target() {
            return Err(RefError::TagImmutable {
                name: reference.canonical_name(),
            });
        }
    }
    Ok(())
}
