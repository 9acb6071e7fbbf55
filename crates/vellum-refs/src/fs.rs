//! Filesystem reference store.
//!
//! Each ref is a small JSON file at its canonical name below the store root,
//! e.g. `<root>/refs/heads/published`. Writes go through a temporary file and
//! an atomic rename. A process-local mutex serializes compare-and-swap
//! sequences; cross-process writers are expected to coordinate externally.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tracing::debug;
use vellum_types::ObjectId;

use crate::error::{RefError, Result};
use crate::names::{validate_ref, validate_state_name};
use crate::traits::{checked_restore, checked_update, RefStore};
use crate::types::{Ref, STATE_PREFIX, TAG_PREFIX};

/// A [`RefStore`] keeping one file per ref.
#[derive(Debug)]
pub struct FsRefStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FsRefStore {
    /// Open (creating if needed) a ref store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        fs::create_dir_all(root.join(STATE_PREFIX))?;
        fs::create_dir_all(root.join(TAG_PREFIX))?;
        Ok(Self {
            root: root.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().expect("lock poisoned")
    }

    /// Map a canonical ref name to its file, refusing anything that could
    /// escape the store root.
    fn ref_path(&self, name: &str) -> Result<PathBuf> {
        let short = name
            .strip_prefix(STATE_PREFIX)
            .or_else(|| name.strip_prefix(TAG_PREFIX))
            .ok_or_else(|| RefError::InvalidName {
                name: name.to_string(),
                reason: format!("must start with {STATE_PREFIX} or {TAG_PREFIX}"),
            })?;
        validate_state_name(short)?;
        Ok(self.root.join(name))
    }

    fn load(&self, path: &Path) -> Result<Option<Ref>> {
        match fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| RefError::Serialization(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, path: &Path, reference: &Ref) -> Result<()> {
        let bytes =
            serde_json::to_vec(reference).map_err(|e| RefError::Serialization(e.to_string()))?;
        let dir = path
            .parent()
            .ok_or_else(|| RefError::Io(std::io::Error::other("ref path has no parent")))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| RefError::Io(e.error))?;
        Ok(())
    }

    fn collect(&self, dir: &Path, out: &mut Vec<(String, Ref)>) -> Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                self.collect(&path, out)?;
                continue;
            }
            // Ref names never start with '.', temporary files always do.
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if let Some(reference) = self.load(&path)? {
                out.push((reference.canonical_name(), reference));
            }
        }
        Ok(())
    }
}

impl RefStore for FsRefStore {
    fn read_ref(&self, name: &str) -> Result<Option<Ref>> {
        let path = self.ref_path(name)?;
        self.load(&path)
    }

    fn create_ref(&self, reference: &Ref) -> Result<()> {
        validate_ref(reference)?;
        let name = reference.canonical_name();
        let path = self.ref_path(&name)?;

        let _guard = self.lock();
        if path.exists() {
            return Err(RefError::AlreadyExists { name });
        }
        self.store(&path, reference)?;
        debug!(reference = %name, target = %reference.target().short_hex(), "created ref");
        Ok(())
    }

    fn update_ref(&self, name: &str, expected: &ObjectId, target: ObjectId) -> Result<Ref> {
        let path = self.ref_path(name)?;

        let _guard = self.lock();
        let current = self.load(&path)?;
        let updated = checked_update(name, current.as_ref(), expected, target)?;
        self.store(&path, &updated)?;
        debug!(
            reference = %name,
            from = %expected.short_hex(),
            to = %target.short_hex(),
            "moved ref"
        );
        Ok(updated)
    }

    fn restore_ref(&self, reference: &Ref) -> Result<()> {
        validate_ref(reference)?;
        let path = self.ref_path(&reference.canonical_name())?;

        let _guard = self.lock();
        checked_restore(self.load(&path)?.as_ref(), reference)?;
        self.store(&path, reference)
    }

    fn delete_ref(&self, name: &str) -> Result<bool> {
        let path = self.ref_path(name)?;
        let _guard = self.lock();
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn list_refs(&self, prefix: &str) -> Result<Vec<(String, Ref)>> {
        let mut all = Vec::new();
        self.collect(&self.root.join("refs"), &mut all)?;
        let mut result: Vec<(String, Ref)> = all
            .into_iter()
            .filter(|(name, _)| name.starts_with(prefix))
            .collect();
        result.sort_by(|(a, _), (b, _)| a.cmp(b));
        Ok(result)
    }
}
