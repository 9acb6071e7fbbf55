use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::config::{Backend, StorageConfig};
use crate::error::{DocumentError, DocumentResult};
use crate::index::DocumentIndex;
use crate::repository::Repository;

/// Handle to a storage root: one repository per document plus the shared
/// document index.
///
/// Cloning is cheap and clones share repositories, so every [`Repository`]
/// for a given name is the same instance within a process.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Inner>,
}

struct Inner {
    config: StorageConfig,
    repositories: Mutex<HashMap<String, Arc<Repository>>>,
    index: Arc<DocumentIndex>,
}

impl Storage {
    /// Open the storage described by `config`, creating the document index
    /// repository if needed.
    pub fn open(config: StorageConfig) -> DocumentResult<Self> {
        let index_repo = Arc::new(open_repository(&config, &config.index_name)?);
        let mut repositories = HashMap::new();
        repositories.insert(config.index_name.clone(), Arc::clone(&index_repo));

        info!(backend = ?config.backend, index = %config.index_name, "opened storage");
        Ok(Self {
            inner: Arc::new(Inner {
                index: Arc::new(DocumentIndex::new(index_repo)),
                repositories: Mutex::new(repositories),
                config,
            }),
        })
    }

    /// Shorthand for in-memory storage.
    pub fn in_memory() -> DocumentResult<Self> {
        Self::open(StorageConfig::memory())
    }

    /// The configuration this storage was opened with.
    pub fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    /// Open or create the repository called `name`.
    pub fn repository(&self, name: &str) -> DocumentResult<Arc<Repository>> {
        let mut repositories = self.inner.repositories.lock().expect("lock poisoned");
        if let Some(repo) = repositories.get(name) {
            return Ok(Arc::clone(repo));
        }
        let repo = Arc::new(open_repository(&self.inner.config, name)?);
        repositories.insert(name.to_string(), Arc::clone(&repo));
        Ok(repo)
    }

    /// Whether a repository called `name` has been created, in this process
    /// or (for filesystem storage) by an earlier one.
    pub fn repository_exists(&self, name: &str) -> DocumentResult<bool> {
        if self
            .inner
            .repositories
            .lock()
            .expect("lock poisoned")
            .contains_key(name)
        {
            return Ok(true);
        }
        match &self.inner.config.backend {
            Backend::Memory => Ok(false),
            Backend::Filesystem { path } => Ok(repository_dir(path, name)?.join("refs").is_dir()),
        }
    }

    /// The index of every document saved in this storage.
    pub fn document_index(&self) -> Arc<DocumentIndex> {
        Arc::clone(&self.inner.index)
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("config", &self.inner.config)
            .finish()
    }
}

fn open_repository(config: &StorageConfig, name: &str) -> DocumentResult<Repository> {
    match &config.backend {
        Backend::Memory => Ok(Repository::in_memory(name)),
        Backend::Filesystem { path } => Repository::open_dir(name, &repository_dir(path, name)?),
    }
}

/// Directory of a repository, refusing names that would leave the root.
fn repository_dir(root: &Path, name: &str) -> DocumentResult<PathBuf> {
    let relative = Path::new(name);
    let plain = !name.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(DocumentError::InvalidArgument(format!(
            "repository name {name:?} is not a relative path"
        )));
    }
    Ok(root.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_repositories_are_shared_between_clones() {
        let storage = Storage::in_memory().unwrap();
        let clone = storage.clone();

        assert!(!storage.repository_exists("doc").unwrap());
        let a = storage.repository("doc").unwrap();
        let b = clone.repository("doc").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(clone.repository_exists("doc").unwrap());
    }

    #[test]
    fn filesystem_repositories_are_directories() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(StorageConfig::filesystem(dir.path())).unwrap();

        storage.repository("doc").unwrap();
        assert!(dir.path().join("doc").join("objects").is_dir());
        assert!(dir.path().join("vellum/document-index").is_dir());

        // A fresh handle sees what an earlier one created.
        let reopened = Storage::open(StorageConfig::filesystem(dir.path())).unwrap();
        assert!(reopened.repository_exists("doc").unwrap());
        assert!(!reopened.repository_exists("other").unwrap());
        // The index's parent directory is not a repository.
        assert!(!reopened.repository_exists("vellum").unwrap());
    }

    #[test]
    fn escaping_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(StorageConfig::filesystem(dir.path())).unwrap();
        for bad in ["../outside", "/abs", ""] {
            assert!(
                matches!(storage.repository(bad), Err(DocumentError::InvalidArgument(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn index_is_shared() {
        let storage = Storage::in_memory().unwrap();
        storage.document_index().register("doc", "article").unwrap();
        assert!(storage.clone().document_index().contains("doc").unwrap());
    }
}
