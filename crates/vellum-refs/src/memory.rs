//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryRefStore`] stores all refs in a `HashMap` protected by a
//! `RwLock`. The write lock is held across each compare-and-swap, so updates
//! from concurrent threads are serialized.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use vellum_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::validate_ref;
use crate::traits::{checked_restore, checked_update, RefStore};
use crate::types::Ref;

/// An in-memory implementation of [`RefStore`].
///
/// Data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<HashMap<String, Ref>>,
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read_map(&self) -> RwLockReadGuard<'_, HashMap<String, Ref>> {
        self.refs.read().expect("lock poisoned")
    }

    fn write_map(&self) -> RwLockWriteGuard<'_, HashMap<String, Ref>> {
        self.refs.write().expect("lock poisoned")
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        Ok(self.read_map().get(name).cloned())
    }

    fn create_ref(&self, reference: &Ref) -> Result<()> {
        validate_ref(reference)?;
        let name = reference.canonical_name();

        let mut refs = self.write_map();
        if refs.contains_key(&name) {
            return Err(RefError::AlreadyExists { name });
        }
        debug!(reference = %name, target = %reference.target().short_hex(), "created ref");
        refs.insert(name, reference.clone());
        Ok(())
    }

    fn update_ref(&self, name: &str, expected: &ObjectId, target: ObjectId) -> Result<Ref> {
        let mut refs = self.write_map();
        let updated = checked_update(name, refs.get(name), expected, target)?;
        debug!(
            reference = %name,
            from = %expected.short_hex(),
            to = %target.short_hex(),
            "moved ref"
        );
        refs.insert(name.to_string(), updated.clone());
        Ok(updated)
    }

    fn restore_ref(&self, reference: &Ref) -> Result<()> {
        validate_ref(reference)?;
        let name = reference.canonical_name();

        let mut refs = self.write_map();
        checked_restore(refs.get(&name), reference)?;
        refs.insert(name, reference.clone());
        Ok(())
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        Ok(self.write_map().remove(name).is_some())
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        let refs = self.read_map();
        let mut result: Vec<(String, Ref)> = refs
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        result.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(result)
    }
}
