use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocumentError, DocumentResult};

/// Where document repositories live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backend {
    /// Process-local maps; everything is lost on drop.
    Memory,
    /// One directory per document below `path`.
    Filesystem {
        #[serde(default = "default_storage_path")]
        path: PathBuf,
    },
}

impl Default for Backend {
    fn default() -> Self {
        Self::Filesystem {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("storage")
}

/// Storage configuration, passed explicitly to [`crate::Storage::open`].
///
/// ```toml
/// index_name = "vellum/document-index"
///
/// [backend]
/// kind = "filesystem"
/// path = "/var/lib/vellum"
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Name of the storage unit that holds the document index.
    pub index_name: String,
    pub backend: Backend,
}

impl StorageConfig {
    pub const DEFAULT_INDEX_NAME: &'static str = "vellum/document-index";

    /// In-memory storage, mostly for tests.
    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory,
            ..Self::default()
        }
    }

    /// Filesystem storage rooted at `path`.
    pub fn filesystem(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: Backend::Filesystem { path: path.into() },
            ..Self::default()
        }
    }

    /// Keep the document index in a repository called `name`.
    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    /// Parse a TOML configuration.
    pub fn from_toml_str(s: &str) -> DocumentResult<Self> {
        toml::from_str(s).map_err(|e| DocumentError::Config(e.to_string()))
    }

    /// Read a TOML configuration file.
    pub fn load(path: &Path) -> DocumentResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DocumentError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_name: Self::DEFAULT_INDEX_NAME.to_string(),
            backend: Backend::default(),
        }
    }
}
