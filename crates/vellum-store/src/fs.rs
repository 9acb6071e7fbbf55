//! Filesystem object store.
//!
//! Objects live under `<root>/objects/<first two hex chars>/<remaining hex>`,
//! git-style. Each file holds the object kind on its first line followed by
//! the raw object data. Files are written to a temporary sibling and renamed
//! into place, so a reader never observes a half-written object.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use vellum_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

const OBJECTS_DIR: &str = "objects";

/// Object store backed by one file per object.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    objects_dir: PathBuf,
}

impl FsObjectStore {
    /// Open (creating if needed) an object store rooted at `root`.
    pub fn open(root: &Path) -> StoreResult<Self> {
        let objects_dir = root.join(OBJECTS_DIR);
        fs::create_dir_all(&objects_dir)?;
        debug!(path = %objects_dir.display(), "opened filesystem object store");
        Ok(Self { objects_dir })
    }

    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let hex = id.to_hex();
        let (fanout, rest) = hex.split_at(2);
        self.objects_dir.join(fanout).join(rest)
    }

    fn decode(id: &ObjectId, raw: Vec<u8>) -> StoreResult<StoredObject> {
        let newline = raw
            .iter()
            .position(|b| *b == b'\n')
            .ok_or_else(|| StoreError::CorruptObject {
                id: *id,
                reason: "missing kind header".into(),
            })?;
        let tag = std::str::from_utf8(&raw[..newline]).unwrap_or_default();
        let kind = ObjectKind::parse(tag).ok_or_else(|| StoreError::CorruptObject {
            id: *id,
            reason: format!("unknown object kind {tag:?}"),
        })?;

        let object = StoredObject::new(kind, raw[newline + 1..].to_vec());
        let computed = object.compute_id();
        if computed != *id {
            return Err(StoreError::HashMismatch { id: *id, computed });
        }
        Ok(object)
    }
}

impl ObjectStore for FsObjectStore {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        match fs::read(self.object_path(id)) {
            Ok(raw) => Self::decode(id, raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, object: &StoredObject) -> StoreResult<ObjectId> {
        let id = object.compute_id();
        let path = self.object_path(&id);
        if path.exists() {
            return Ok(id);
        }

        let dir = path
            .parent()
            .ok_or_else(|| StoreError::Io(std::io::Error::other("object path has no parent")))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(object.kind.as_str().as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.write_all(&object.data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        trace!(object = %id.short_hex(), kind = %object.kind, size = object.size, "wrote object");
        Ok(id)
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }

    fn list_ids(&self) -> StoreResult<Vec<ObjectId>> {
        let mut ids = Vec::new();
        for fanout in fs::read_dir(&self.objects_dir)? {
            let fanout = fanout?;
            if !fanout.file_type()?.is_dir() {
                continue;
            }
            let prefix = fanout.file_name().to_string_lossy().into_owned();
            for entry in fs::read_dir(fanout.path())? {
                let name = entry?.file_name().to_string_lossy().into_owned();
                // Leftover temporary files are not objects.
                if let Ok(id) = ObjectId::from_hex(&format!("{prefix}{name}")) {
                    ids.push(id);
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
