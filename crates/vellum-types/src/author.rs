use std::fmt;

use serde::{Deserialize, Serialize};

/// The person (or system) responsible for a revision.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    /// An author with a display name and email address.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// The fixed author recorded on every document's root revision.
    pub fn system() -> Self {
        Self::new("Vellum", "system@vellum.invalid")
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_like_git() {
        let author = Author::new("Jane Doe", "jane@example.com");
        assert_eq!(author.to_string(), "Jane Doe <jane@example.com>");
    }

    #[test]
    fn system_author_is_stable() {
        assert_eq!(Author::system(), Author::system());
    }
}
