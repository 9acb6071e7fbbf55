use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard};

use tracing::trace;
use vellum_types::ObjectId;

use crate::error::StoreResult;
use crate::object::StoredObject;
use crate::traits::ObjectStore;

/// Object store backed by a map, for tests and for in-memory storage roots.
///
/// Nothing is verified on read: objects only ever enter through [`write`],
/// which keys them by their own hash.
///
/// [`write`]: ObjectStore::write
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectId, StoredObject>>,
}

impl InMemoryObjectStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> RwLockReadGuard<'_, HashMap<ObjectId, StoredObject>> {
        self.objects.read().expect("lock poisoned")
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects().len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects().is_empty()
    }

    /// Sum of the payload sizes of every object held.
    pub fn total_bytes(&self) -> u64 {
        self.objects().values().map(|obj| obj.size).sum()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        Ok(self.objects().get(id).cloned())
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        self.objects
            .write()
            .expect("lock poisoned")
            .entry(id)
            .or_insert_with(|| {
                trace!(object = %id.short_hex(), kind = %object.kind, "stored object");
                object.clone()
            });
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.objects().contains_key(id))
    }

    fn list_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids: Vec<ObjectId> = self.objects().keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("objects", &self.len())
            .finish()
    }
}
