//! State and tag name validation following git-style conventions.
//!
//! Valid names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `.` or `/`
//! - Must not end with `.lock`
//! - Components between slashes must be non-empty and not start with `.`

use crate::error::{RefError, Result};
use crate::types::Ref;

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a workflow state name, returning `Ok(())` if valid.
///
/// State names double as file paths in the filesystem ref store, so the same
/// rules that keep git branch names unambiguous apply here.
///
/// # Examples
///
/// ```
/// use vellum_refs::names::validate_state_name;
///
/// assert!(validate_state_name("published").is_ok());
/// assert!(validate_state_name("review/legal").is_ok());
/// assert!(validate_state_name("").is_err());
/// assert!(validate_state_name("bad..name").is_err());
/// ```
pub fn validate_state_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }

    if let Some(ch) = FORBIDDEN_CHARS.iter().find(|ch| name.contains(**ch)) {
        return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid(name, "must not contain whitespace"));
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }
    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }
    if name.ends_with(".lock") {
        return Err(invalid(name, "must not end with '.lock'"));
    }

    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }

    Ok(())
}

/// Validate a tag name. Same rules as state names.
pub fn validate_tag_name(name: &str) -> Result<()> {
    validate_state_name(name)
}

/// Validate the short name of a ref according to its kind.
pub(crate) fn validate_ref(reference: &Ref) -> Result<()> {
    match reference {
        Ref::State { name, .. } => validate_state_name(name),
        Ref::Tag { name, .. } => validate_tag_name(name),
    }
}
