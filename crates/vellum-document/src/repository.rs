//! A single storage unit: the objects and refs of one document (or of the
//! document index).

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use vellum_refs::{FsRefStore, InMemoryRefStore, Ref, RefStore};
use vellum_store::{
    Blob, CommitObject, FsObjectStore, InMemoryObjectStore, ObjectStore, StoredObject, Tree,
};
use vellum_types::{Content, ObjectId};

use crate::error::{DocumentError, DocumentResult};

/// Ref naming a document's synthetic root revision.
pub const ROOT_TAG: &str = "root";

/// Objects plus refs for one storage unit.
pub struct Repository {
    name: String,
    objects: Arc<dyn ObjectStore>,
    refs: Arc<dyn RefStore>,
}

impl Repository {
    /// A repository over the given object and ref stores.
    pub fn new(
        name: impl Into<String>,
        objects: Arc<dyn ObjectStore>,
        refs: Arc<dyn RefStore>,
    ) -> Self {
        Self {
            name: name.into(),
            objects,
            refs,
        }
    }

    /// A repository that lives only in memory.
    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(
            name,
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRefStore::new()),
        )
    }

    /// Open (creating if needed) a repository in the directory `dir`.
    pub fn open_dir(name: impl Into<String>, dir: &Path) -> DocumentResult<Self> {
        let objects = FsObjectStore::open(dir)?;
        let refs = FsRefStore::open(dir)?;
        debug!(path = %dir.display(), "opened repository");
        Ok(Self::new(name, Arc::new(objects), Arc::new(refs)))
    }

    /// The repository name; for documents, the document id.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The underlying object store.
    pub fn object_store(&self) -> &dyn ObjectStore {
        self.objects.as_ref()
    }

    /// The underlying ref store.
    pub fn ref_store(&self) -> &dyn RefStore {
        self.refs.as_ref()
    }

    // -----------------------------------------------------------------------
    // Revision objects
    // -----------------------------------------------------------------------

    pub(crate) fn read_commit(&self, id: &ObjectId) -> DocumentResult<CommitObject> {
        let object = self.objects.fetch(id)?;
        Ok(CommitObject::from_stored_object(&object)?)
    }

    /// Load the content stored under a revision tree.
    pub(crate) fn read_content(&self, tree: &ObjectId) -> DocumentResult<Content> {
        let tree = Tree::from_stored_object(&self.objects.fetch(tree)?)?;
        let blob_id = tree.content_blob().ok_or_else(|| {
            DocumentError::Integrity(format!("tree in {} has no content entry", self.name))
        })?;
        let blob = Blob::from_stored_object(&self.objects.fetch(&blob_id)?)?;
        Ok(Content::from_slice(&blob.data)?)
    }

    /// Write content as a blob wrapped in a single-entry tree. Returns the tree id.
    pub(crate) fn write_content(&self, content: &Content) -> DocumentResult<ObjectId> {
        let blob = Blob::new(content.to_canonical_bytes()?);
        let blob_id = self.objects.write(&blob.to_stored_object())?;
        let tree = Tree::with_content(blob_id);
        Ok(self.objects.write(&tree.to_stored_object()?)?)
    }

    pub(crate) fn write_commit(&self, commit: &CommitObject) -> DocumentResult<ObjectId> {
        Ok(self.objects.write(&commit.to_stored_object()?)?)
    }

    // -----------------------------------------------------------------------
    // Pointers
    // -----------------------------------------------------------------------

    /// Current target of a state, including a state rolled back to the root.
    pub fn state_target(&self, state: &str) -> DocumentResult<Option<ObjectId>> {
        Ok(self.refs.resolve(&Ref::state_ref_name(state))?)
    }

    /// Move a state to `target`. With `expected == None` the state must not
    /// exist yet; otherwise it must still point at `expected`.
    pub(crate) fn move_state(
        &self,
        state: &str,
        expected: Option<ObjectId>,
        target: ObjectId,
    ) -> DocumentResult<()> {
        match expected {
            None => self.refs.create_ref(&Ref::state(state, target))?,
            Some(expected) => {
                self.refs
                    .update_ref(&Ref::state_ref_name(state), &expected, target)?;
            }
        }
        Ok(())
    }

    pub(crate) fn root_target(&self) -> DocumentResult<Option<ObjectId>> {
        Ok(self.refs.resolve(&Ref::tag_ref_name(ROOT_TAG))?)
    }

    // -----------------------------------------------------------------------
    // Raw access for backup and restore
    // -----------------------------------------------------------------------

    /// Every object id in the repository, sorted.
    pub fn object_ids(&self) -> DocumentResult<Vec<ObjectId>> {
        Ok(self.objects.list_ids()?)
    }

    /// Read a raw object, failing if it is missing.
    pub fn read_object(&self, id: &ObjectId) -> DocumentResult<StoredObject> {
        Ok(self.objects.fetch(id)?)
    }

    /// Import an object under a claimed id, refusing data that hashes to
    /// something else.
    pub fn import_object(&self, id: &ObjectId, object: &StoredObject) -> DocumentResult<()> {
        let computed = object.compute_id();
        if computed != *id {
            return Err(DocumentError::Integrity(format!(
                "object claimed as {id} hashes to {computed}"
            )));
        }
        self.objects.write(object)?;
        Ok(())
    }

    /// Every ref in the repository, sorted by canonical name.
    pub fn refs(&self) -> DocumentResult<Vec<Ref>> {
        Ok(self
            .refs
            .list_refs("")?
            .into_iter()
            .map(|(_, r)| r)
            .collect())
    }

    /// Restore a ref from a backup. The target must already be present.
    pub fn restore_ref(&self, reference: &Ref) -> DocumentResult<()> {
        if !self.objects.exists(&reference.target())? {
            return Err(DocumentError::Integrity(format!(
                "{} points at missing object {}",
                reference.canonical_name(),
                reference.target()
            )));
        }
        Ok(self.refs.restore_ref(reference)?)
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").field("name", &self.name).finish()
    }
}
