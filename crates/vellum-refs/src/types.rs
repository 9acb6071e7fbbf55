//! Core reference types.

use serde::{Deserialize, Serialize};
use vellum_types::ObjectId;

/// Namespace of workflow state refs.
pub const STATE_PREFIX: &str = "refs/heads/";
/// Namespace of immutable tag refs.
pub const TAG_PREFIX: &str = "refs/tags/";

/// A named reference to a revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Ref {
    /// Mutable pointer to the tip of a workflow state (e.g. "published").
    State {
        name: String,
        target: ObjectId,
    },

    /// Immutable pointer to a specific revision.
    Tag {
        name: String,
        target: ObjectId,
    },
}

impl Ref {
    /// A movable state pointer, e.g. `master`.
    pub fn state(name: impl Into<String>, target: ObjectId) -> Self {
        Ref::State {
            name: name.into(),
            target,
        }
    }

    /// An immutable tag.
    pub fn tag(name: impl Into<String>, target: ObjectId) -> Self {
        Ref::Tag {
            name: name.into(),
            target,
        }
    }

    /// Canonical name of a state ref, e.g. `refs/heads/master`.
    pub fn state_ref_name(state: &str) -> String {
        format!("{STATE_PREFIX}{state}")
    }

    /// Canonical name of a tag ref, e.g. `refs/tags/root`.
    pub fn tag_ref_name(tag: &str) -> String {
        format!("{TAG_PREFIX}{tag}")
    }

    /// Returns the canonical name for this ref (e.g. "refs/heads/master").
    pub fn canonical_name(&self) -> String {
        match self {
            Ref::State { name, .. } => Self::state_ref_name(name),
            Ref::Tag { name, .. } => Self::tag_ref_name(name),
        }
    }

    /// Returns the short name of this ref (without the namespace prefix).
    pub fn short_name(&self) -> &str {
        match self {
            Ref::State { name, .. } | Ref::Tag { name, .. } => name,
        }
    }

    /// The revision this ref points to.
    pub fn target(&self) -> ObjectId {
        match self {
            Ref::State { target, .. } | Ref::Tag { target, .. } => *target,
        }
    }

    /// Returns `true` if this is a tag ref.
    pub fn is_tag(&self) -> bool {
        matches!(self, Ref::Tag { .. })
    }

    /// Copy of this ref pointing elsewhere.
    pub fn retarget(&self, target: ObjectId) -> Self {
        match self {
            Ref::State { name, .. } => Ref::state(name.clone(), target),
            Ref::Tag { name, .. } => Ref::tag(name.clone(), target),
        }
    }
}
