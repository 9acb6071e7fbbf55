use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Stable identifier of a document.
///
/// A document id names its storage unit (a directory for filesystem storage),
/// so besides being free of whitespace it must be a single path component.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate and wrap a caller-supplied id.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        let reject = |reason: &str| TypeError::InvalidDocumentId {
            id: id.clone(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            return Err(reject("must not be empty"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(reject("must not contain whitespace"));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(reject("must not contain path separators"));
        }
        if id == "." || id == ".." {
            return Err(reject("must not be a relative path component"));
        }
        Ok(Self(id))
    }

    /// A fresh random id: 32 lowercase hex characters.
    pub fn random() -> Self {
        let bytes: [u8; 16] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentId({})", self.0)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DocumentId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> Self {
        id.0
    }
}

/// Symbolic type name of a document (e.g. `article`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentType(String);

impl DocumentType {
    /// Name used when no type is given.
    pub const DEFAULT: &'static str = "document";

    /// Validate and wrap a type name.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TypeError::InvalidDocumentType {
                name,
                reason: "must not be empty".into(),
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(TypeError::InvalidDocumentType {
                name,
                reason: "must not contain whitespace".into(),
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for DocumentType {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Debug for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentType({})", self.0)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentType {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocumentType> for String {
    fn from(t: DocumentType) -> Self {
        t.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_ids() {
        assert_eq!(DocumentId::new("test").unwrap().as_str(), "test");
        assert!(DocumentId::new("article-42_v2.json").is_ok());
    }

    #[test]
    fn rejects_whitespace_and_paths() {
        for bad in ["", "has space", "tab\there", "a/b", "..", "."] {
            assert!(
                matches!(DocumentId::new(bad), Err(TypeError::InvalidDocumentId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn random_ids_are_hex_and_distinct() {
        let a = DocumentId::random();
        let b = DocumentId::random();
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn document_type_validation() {
        assert!(DocumentType::new("article").is_ok());
        assert!(DocumentType::new("").is_err());
        assert!(DocumentType::new("two words").is_err());
        assert_eq!(DocumentType::default().as_str(), "document");
    }

    #[test]
    fn serde_revalidates() {
        let parsed: Result<DocumentId, _> = serde_json::from_str("\"bad id\"");
        assert!(parsed.is_err());
        let ok: DocumentId = serde_json::from_str("\"good\"").unwrap();
        assert_eq!(ok.as_str(), "good");
    }
}
