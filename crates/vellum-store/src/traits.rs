use vellum_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::StoredObject;

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written; the same kind and data always
///   produce the same ID.
/// - Writing an object that already exists is a no-op returning the same ID.
/// - Concurrent reads are always safe.
/// - The store never interprets object contents.
pub trait ObjectStore: Send + Sync {
    /// Read an object by its content-addressed ID.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>>;

    /// Write an object and return its content-addressed ID.
    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// All object IDs in the store, sorted.
    fn list_ids(&self) -> StoreResult<Vec<ObjectId>>;

    /// Read an object that is required to exist.
    ///
    /// Fails with [`StoreError::NotFound`] instead of returning `None`.
    fn fetch(&self, id: &ObjectId) -> StoreResult<StoredObject> {
        self.read(id)?.ok_or(StoreError::NotFound(*id))
    }
}
