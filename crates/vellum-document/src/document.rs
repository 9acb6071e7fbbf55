//! The document aggregate: working content plus named states over a
//! revision graph.
//!
//! Saves append to a state's timeline; promotions copy the tip of one state
//! into another as a revision that links back to its origin. `master` is the
//! editing timeline and only ever moves forward.

use std::sync::Arc;

use tracing::{info, warn};
use vellum_refs::{validate_state_name, Ref, RefError};
use vellum_types::{Author, Content, DocumentId, DocumentType, ObjectId};

use crate::collection::RevisionCollection;
use crate::error::{DocumentError, DocumentResult};
use crate::history::History;
use crate::index::DocumentIndex;
use crate::indexer::{Indexer, NoopIndexer, RevisionEvent};
use crate::repository::{Repository, ROOT_TAG};
use crate::revision::{Change, NewRevision, PointerUpdate, Revision, RevisionKind};
use crate::storage::Storage;

/// The default state. Saves go here unless told otherwise.
pub const MASTER: &str = "master";

const ROOT_MESSAGE: &str = "root";

/// A versioned document.
pub struct Document {
    id: DocumentId,
    doc_type: DocumentType,
    content: Content,
    revision: Option<Revision>,
    repo: Arc<Repository>,
    revisions: RevisionCollection,
    index: Arc<DocumentIndex>,
    indexer: Arc<dyn Indexer>,
}

impl Document {
    /// A new document with a random id.
    pub fn new(storage: &Storage, doc_type: &str, content: Content) -> DocumentResult<Self> {
        Self::build(storage, DocumentId::random(), DocumentType::new(doc_type)?, content)
    }

    /// A new document with a caller-chosen id.
    pub fn with_id(
        storage: &Storage,
        id: &str,
        doc_type: &str,
        content: Content,
    ) -> DocumentResult<Self> {
        Self::build(storage, DocumentId::new(id)?, DocumentType::new(doc_type)?, content)
    }

    /// Open an existing document and load `rev` (a state name or revision
    /// id, `master` by default).
    ///
    /// Returns `None` if the document was never saved or `rev` does not
    /// resolve. The type comes from the document index.
    pub fn open(storage: &Storage, id: &str, rev: Option<&str>) -> DocumentResult<Option<Self>> {
        let id = DocumentId::new(id)?;
        if !storage.repository_exists(id.as_str())? {
            return Ok(None);
        }
        let doc_type = match storage.document_index().lookup(id.as_str())? {
            Some(entry) => DocumentType::new(entry.doc_type)?,
            None => DocumentType::default(),
        };

        let mut document = Self::build(storage, id, doc_type, Content::empty())?;
        // A handle created with `new` but never saved leaves no root behind.
        if document.revisions.root_id()?.is_none() {
            return Ok(None);
        }
        if document.load(rev.unwrap_or(MASTER))?.is_none() {
            return Ok(None);
        }
        Ok(Some(document))
    }

    fn build(
        storage: &Storage,
        id: DocumentId,
        doc_type: DocumentType,
        content: Content,
    ) -> DocumentResult<Self> {
        if id.as_str() == storage.config().index_name {
            return Err(DocumentError::InvalidArgument(format!(
                "document id {id} is reserved for the document index"
            )));
        }
        let repo = storage.repository(id.as_str())?;
        Ok(Self {
            revisions: RevisionCollection::new(Arc::clone(&repo)),
            index: storage.document_index(),
            indexer: Arc::new(NoopIndexer),
            revision: None,
            id,
            doc_type,
            content,
            repo,
        })
    }

    /// Report saves and promotions to `indexer`.
    pub fn with_indexer(mut self, indexer: Arc<dyn Indexer>) -> Self {
        self.indexer = indexer;
        self
    }

    /// The document's id, also the name of its repository.
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    /// The document's type, as recorded in the index.
    pub fn doc_type(&self) -> &DocumentType {
        &self.doc_type
    }

    /// The working content: what the next save will store.
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Mutable access to the working content.
    pub fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    /// Replace the working content.
    pub fn set_content(&mut self, content: Content) {
        self.content = content;
    }

    /// The revision last saved, promoted or loaded through this handle.
    pub fn revision(&self) -> Option<&Revision> {
        self.revision.as_ref()
    }

    /// Lookups and history over this document's revisions.
    pub fn revisions(&self) -> &RevisionCollection {
        &self.revisions
    }

    /// The repository holding this document's objects and refs.
    pub fn repository(&self) -> &Arc<Repository> {
        &self.repo
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Save the working content into `master`.
    pub fn save(&mut self, change: Change) -> DocumentResult<Revision> {
        self.save_in(MASTER, change)
    }

    /// Save the working content as the new tip of `state`.
    ///
    /// Saving into a state other than `master` is allowed, but that state's
    /// timeline then holds a revision that was never promoted from anywhere.
    pub fn save_in(&mut self, state: &str, change: Change) -> DocumentResult<Revision> {
        check_state(state)?;
        let root = self.ensure_initialized(&change)?;
        if state != MASTER {
            warn!(document = %self.id, state, "saving directly into a non-master state");
        }

        let tip = self.repo.state_target(state)?;
        let new = NewRevision::new(self.content.clone(), change)
            .with_previous(tip.unwrap_or(root))
            .in_state(state);
        let mut revision = Revision::create(Arc::clone(&self.repo), Some(root), new)?;
        let id = revision.write(Some(&PointerUpdate::new(state, tip)))?;
        info!(document = %self.id, state, revision = %id.short_hex(), "saved revision");

        self.after_write(&revision, state, None)?;
        self.revision = Some(revision.clone());
        Ok(revision)
    }

    /// Promote the tip of `from` into `to`.
    ///
    /// The new revision carries the content of `from`'s tip, its previous
    /// link is `to`'s prior tip (or the root) and its origin is `from`'s tip.
    /// The working content is left alone.
    pub fn promote(&mut self, from: &str, to: &str, change: Change) -> DocumentResult<Revision> {
        check_state(to)?;
        let origin = self.revisions.state(from)?.ok_or_else(|| {
            DocumentError::InvalidState(format!("state {from} has no revision to promote"))
        })?;
        let origin_id = origin
            .id()
            .ok_or_else(|| DocumentError::InvalidState(format!("tip of {from} is unwritten")))?;
        let root = self.ensure_initialized(&change)?;

        let tip = self.repo.state_target(to)?;
        let new = NewRevision::new(origin.content()?.clone(), change)
            .with_previous(tip.unwrap_or(root))
            .with_origin(origin_id)
            .in_state(to);
        let mut revision = Revision::create(Arc::clone(&self.repo), Some(root), new)?;
        let id = revision.write(Some(&PointerUpdate::new(to, tip)))?;
        info!(
            document = %self.id,
            from,
            to,
            origin = %origin_id.short_hex(),
            revision = %id.short_hex(),
            "promoted revision"
        );

        self.after_write(&revision, to, Some(from))?;
        self.revision = Some(revision.clone());
        Ok(revision)
    }

    /// Move a state back to its previous revision.
    ///
    /// Returns the new tip, or `None` when the state fell back to the root
    /// and so has no revision any more. `master` never moves backwards.
    pub fn rollback(&mut self, state: &str) -> DocumentResult<Option<Revision>> {
        check_state(state)?;
        if state == MASTER {
            return Err(DocumentError::InvalidState(format!(
                "{MASTER} cannot be rolled back"
            )));
        }
        let tip = self.revisions.state(state)?.ok_or_else(|| {
            DocumentError::InvalidState(format!("state {state} has no revision to roll back"))
        })?;
        let tip_id = tip
            .id()
            .ok_or_else(|| DocumentError::InvalidState(format!("tip of {state} is unwritten")))?;
        let previous = tip.previous()?.ok_or_else(|| {
            DocumentError::Integrity(format!(
                "revision {tip_id} in {state} has no previous revision"
            ))
        })?;
        let previous_id = previous.id().ok_or_else(|| {
            DocumentError::Integrity(format!("previous of {tip_id} has no id"))
        })?;

        self.repo.move_state(state, Some(tip_id), previous_id)?;
        info!(
            document = %self.id,
            state,
            from = %tip_id.short_hex(),
            to = %previous_id.short_hex(),
            "rolled back state"
        );
        Ok((!previous.is_root()).then_some(previous))
    }

    /// Create the root revision and its tag on first use.
    fn ensure_initialized(&self, change: &Change) -> DocumentResult<ObjectId> {
        if let Some(root) = self.revisions.root_id()? {
            return Ok(root);
        }

        let root_change = Change::new(Author::system())
            .with_message(ROOT_MESSAGE)
            .with_timestamp(change.timestamp);
        let mut root = Revision::create(
            Arc::clone(&self.repo),
            None,
            NewRevision::new(Content::empty(), root_change),
        )?;
        let id = root.write(None)?;

        match self.repo.ref_store().create_ref(&Ref::tag(ROOT_TAG, id)) {
            Ok(()) => {
                info!(document = %self.id, root = %id.short_hex(), "initialized document");
                self.revisions.set_root(id);
                Ok(id)
            }
            // Someone else initialized the document first; theirs is the root.
            Err(RefError::AlreadyExists { .. }) => {
                let winner = self.repo.root_target()?.ok_or_else(|| {
                    DocumentError::NotFound(format!("root tag of {}", self.id))
                })?;
                self.revisions.set_root(winner);
                Ok(winner)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Register the document and tell the indexer about a new revision.
    fn after_write(
        &self,
        revision: &Revision,
        state: &str,
        from: Option<&str>,
    ) -> DocumentResult<()> {
        self.index.register(self.id.as_str(), self.doc_type.as_str())?;

        let Some(id) = revision.id() else {
            return Ok(());
        };
        let event = RevisionEvent {
            document: self.id.clone(),
            doc_type: self.doc_type.clone(),
            revision: id,
            kind: if from.is_some() {
                RevisionKind::Promotion
            } else {
                RevisionKind::Save
            },
            state: state.to_string(),
            from: from.map(str::to_string),
            author: revision.author()?.clone(),
            timestamp: revision.timestamp()?,
            content: revision.content()?.plain(),
        };
        if let Err(error) = self.indexer.index(&event) {
            warn!(
                document = %self.id,
                revision = %id.short_hex(),
                %error,
                "indexer failed, revision is saved regardless"
            );
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Reading
    // -----------------------------------------------------------------------

    /// Replace the working content and current revision with `rev` (a state
    /// name or revision id). Returns `None`, changing nothing, if `rev` does
    /// not resolve, including ids of revisions this document never stored.
    pub fn load(&mut self, rev: &str) -> DocumentResult<Option<Revision>> {
        let Some(revision) = self.revisions.lookup(rev)? else {
            return Ok(None);
        };
        if let Some(id) = revision.id() {
            if !self.repo.object_store().exists(&id)? {
                return Ok(None);
            }
        }
        self.content = revision.content()?.clone();
        self.revision = Some(revision.clone());
        Ok(Some(revision))
    }

    /// Was `rev` (by default the current revision) promoted into `to`?
    pub fn has_been_promoted(&self, to: &str, rev: Option<&ObjectId>) -> DocumentResult<bool> {
        check_state(to)?;
        let target = match rev {
            Some(id) => Some(*id),
            None => self.revision.as_ref().and_then(Revision::id),
        };
        let Some(target) = target else {
            return Ok(false);
        };
        match self.revisions.lookup(&target.to_hex())? {
            Some(revision) => revision.has_been_promoted(to),
            None => Ok(false),
        }
    }

    /// Revisions of a state (or from a revision id) back to, but excluding,
    /// the root.
    pub fn history(&self, state_or_id: &str) -> History<'_> {
        self.revisions.history(state_or_id)
    }

    /// Names of all states that have a revision, sorted.
    pub fn states(&self) -> DocumentResult<Vec<String>> {
        let root = self.revisions.root_id()?;
        Ok(self
            .repo
            .ref_store()
            .states()?
            .into_iter()
            .filter(|(_, r)| Some(r.target()) != root)
            .map(|(_, r)| r.short_name().to_string())
            .collect())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("type", &self.doc_type)
            .field("revision", &self.revision.as_ref().and_then(Revision::id))
            .finish()
    }
}

fn check_state(state: &str) -> DocumentResult<()> {
    validate_state_name(state).map_err(|e| DocumentError::InvalidArgument(e.to_string()))
}
