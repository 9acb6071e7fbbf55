use std::cell::Cell;
use std::sync::Arc;

use vellum_refs::validate_state_name;
use vellum_types::ObjectId;

use crate::error::{DocumentError, DocumentResult};
use crate::history::History;
use crate::repository::Repository;
use crate::revision::Revision;

/// Resolves state names and revision ids of one document to [`Revision`]s.
///
/// The root revision id is cached after the first successful lookup; it
/// never changes once a document is initialized.
pub struct RevisionCollection {
    repo: Arc<Repository>,
    root: Cell<Option<ObjectId>>,
}

impl RevisionCollection {
    /// A collection over the revisions in `repo`.
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            repo,
            root: Cell::new(None),
        }
    }

    /// Id of the root revision, `None` before the document's first save.
    pub fn root_id(&self) -> DocumentResult<Option<ObjectId>> {
        if let Some(root) = self.root.get() {
            return Ok(Some(root));
        }
        let root = self.repo.root_target()?;
        self.root.set(root);
        Ok(root)
    }

    pub(crate) fn set_root(&self, root: ObjectId) {
        self.root.set(Some(root));
    }

    /// The synthetic root revision.
    pub fn root_revision(&self) -> DocumentResult<Option<Revision>> {
        Ok(self.root_id()?.map(|root| self.bind(root, None)))
    }

    /// Resolve a revision id or a state name.
    ///
    /// A 64-character hex string is taken as a revision id and bound without
    /// touching storage. Anything else is a state name: `None` if the state
    /// has no revision of its own yet, otherwise its tip tagged with the state.
    /// The root revision is never returned.
    pub fn lookup(&self, name_or_id: &str) -> DocumentResult<Option<Revision>> {
        if ObjectId::is_hex_id(name_or_id) {
            let id = ObjectId::from_hex(name_or_id)?;
            if self.root_id()? == Some(id) {
                return Ok(None);
            }
            return Ok(Some(self.bind(id, None)));
        }
        self.state(name_or_id)
    }

    /// Tip of a state, `None` if unset or pointing at the root.
    pub fn state(&self, state: &str) -> DocumentResult<Option<Revision>> {
        validate_state_name(state).map_err(|e| DocumentError::InvalidArgument(e.to_string()))?;
        let Some(tip) = self.repo.state_target(state)? else {
            return Ok(None);
        };
        if self.root_id()? == Some(tip) {
            return Ok(None);
        }
        Ok(Some(self.bind(tip, Some(state.to_string()))))
    }

    /// Revisions from `name_or_id` back along previous links, root excluded.
    ///
    /// Nothing is resolved until the first call to `next`, and every call to
    /// `history` starts again from the stored pointer.
    pub fn history(&self, name_or_id: &str) -> History<'_> {
        History::new(self, name_or_id)
    }

    fn bind(&self, id: ObjectId, state: Option<String>) -> Revision {
        Revision::from_id(Arc::clone(&self.repo), self.root.get(), id, state)
    }
}

impl std::fmt::Debug for RevisionCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionCollection")
            .field("repository", &self.repo.name())
            .field("root", &self.root.get())
            .finish()
    }
}
