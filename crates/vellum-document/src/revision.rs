//! Revisions: immutable snapshots in a document's revision graph.
//!
//! A revision refers to its neighbours by id only. Following a link binds a
//! new lazy [`Revision`] to the same repository; nothing is read from storage
//! until one of the accessors needs it.

use std::cell::OnceCell;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use vellum_store::CommitObject;
use vellum_types::{Author, Content, ObjectId};

use crate::error::{DocumentError, DocumentResult};
use crate::repository::Repository;

/// What kind of node a revision is, derived from its parent links.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionKind {
    /// No parents. Only the root revision.
    Orphan,
    /// A previous revision and no origin.
    Save,
    /// Both a previous revision and an origin in another state.
    Promotion,
}

impl std::fmt::Display for RevisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Orphan => write!(f, "orphan"),
            Self::Save => write!(f, "save"),
            Self::Promotion => write!(f, "promotion"),
        }
    }
}

/// Which parent link a walk follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// First parent: the prior revision in the same state.
    Previous,
    /// Second parent: the revision a promotion came from.
    Origin,
}

/// Who made a change, why, and when.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Change {
    pub author: Author,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Change {
    /// A change by `author` with an empty message, stamped now.
    pub fn new(author: Author) -> Self {
        Self {
            author,
            message: String::new(),
            timestamp: Utc::now(),
        }
    }

    /// Set the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Set the timestamp, overriding the current time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

impl From<Author> for Change {
    fn from(author: Author) -> Self {
        Self::new(author)
    }
}

/// Everything needed to create an unwritten revision.
#[derive(Clone, Debug)]
pub struct NewRevision {
    content: Content,
    change: Change,
    previous: Option<ObjectId>,
    origin: Option<ObjectId>,
    state: Option<String>,
}

impl NewRevision {
    /// A revision of `content` described by `change`, with no links yet.
    pub fn new(content: Content, change: Change) -> Self {
        Self {
            content,
            change,
            previous: None,
            origin: None,
            state: None,
        }
    }

    /// Link to the prior revision of the same state.
    pub fn with_previous(mut self, previous: ObjectId) -> Self {
        self.previous = Some(previous);
        self
    }

    /// Link to the revision this one is promoted from.
    pub fn with_origin(mut self, origin: ObjectId) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The state whose timeline the revision joins.
    pub fn in_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }
}

/// The state pointer to move when a revision is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointerUpdate {
    pub state: String,
    /// Where the pointer must currently be; `None` means it must not exist.
    pub expected: Option<ObjectId>,
}

impl PointerUpdate {
    /// Move `state`, expecting it to currently point at `expected`.
    pub fn new(state: impl Into<String>, expected: Option<ObjectId>) -> Self {
        Self {
            state: state.into(),
            expected,
        }
    }
}

#[derive(Clone, Debug)]
struct Header {
    tree: Option<ObjectId>,
    author: Author,
    message: String,
    timestamp: DateTime<Utc>,
    previous: Option<ObjectId>,
    origin: Option<ObjectId>,
}

impl From<CommitObject> for Header {
    fn from(commit: CommitObject) -> Self {
        Self {
            tree: Some(commit.tree),
            previous: commit.previous(),
            origin: commit.origin(),
            author: commit.author,
            message: commit.message,
            timestamp: commit.timestamp,
        }
    }
}

/// One snapshot of a document.
///
/// A revision is either freshly created (all fields in memory, no id until
/// [`Revision::write`]) or bound to the id of a stored commit, in which case
/// metadata and content are loaded on first access and cached.
#[derive(Clone)]
pub struct Revision {
    repo: Arc<Repository>,
    root: Option<ObjectId>,
    id: Option<ObjectId>,
    state: Option<String>,
    header: OnceCell<Header>,
    content: OnceCell<Content>,
}

impl Revision {
    /// Build an unwritten revision.
    ///
    /// Fails if an origin is given without a previous revision: a promotion
    /// always links from some tip of its target state, the root at worst.
    pub fn create(
        repo: Arc<Repository>,
        root: Option<ObjectId>,
        new: NewRevision,
    ) -> DocumentResult<Self> {
        if new.origin.is_some() && new.previous.is_none() {
            return Err(DocumentError::InvalidArgument(
                "a revision with an origin needs a previous revision".into(),
            ));
        }
        let header = Header {
            tree: None,
            author: new.change.author,
            message: new.change.message,
            timestamp: new.change.timestamp,
            previous: new.previous,
            origin: new.origin,
        };
        Ok(Self {
            repo,
            root,
            id: None,
            state: new.state,
            header: OnceCell::from(header),
            content: OnceCell::from(new.content),
        })
    }

    /// Bind a revision to a stored commit without reading it.
    pub(crate) fn from_id(
        repo: Arc<Repository>,
        root: Option<ObjectId>,
        id: ObjectId,
        state: Option<String>,
    ) -> Self {
        Self {
            repo,
            root,
            id: Some(id),
            state,
            header: OnceCell::new(),
            content: OnceCell::new(),
        }
    }

    /// Commit id, absent until written.
    pub fn id(&self) -> Option<ObjectId> {
        self.id
    }

    /// The state this revision was reached through, when known.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Whether the revision has been stored and has an id.
    pub fn is_written(&self) -> bool {
        self.id.is_some()
    }

    /// Whether this is the document's synthetic root revision.
    pub fn is_root(&self) -> bool {
        self.id.is_some() && self.id == self.root
    }

    fn header(&self) -> DocumentResult<&Header> {
        if let Some(header) = self.header.get() {
            return Ok(header);
        }
        let id = self
            .id
            .ok_or_else(|| DocumentError::InvalidState("revision has neither id nor data".into()))?;
        trace!(revision = %id.short_hex(), "loading commit");
        let loaded = Header::from(self.repo.read_commit(&id)?);
        Ok(self.header.get_or_init(|| loaded))
    }

    /// Who made the revision.
    pub fn author(&self) -> DocumentResult<&Author> {
        Ok(&self.header()?.author)
    }

    /// The revision message.
    pub fn message(&self) -> DocumentResult<&str> {
        Ok(&self.header()?.message)
    }

    /// When the revision was made.
    pub fn timestamp(&self) -> DocumentResult<DateTime<Utc>> {
        Ok(self.header()?.timestamp)
    }

    /// The revision's content, loaded from its tree on first access.
    pub fn content(&self) -> DocumentResult<&Content> {
        if let Some(content) = self.content.get() {
            return Ok(content);
        }
        let tree = self.header()?.tree.ok_or_else(|| {
            DocumentError::InvalidState("unwritten revision has no content tree".into())
        })?;
        let loaded = self.repo.read_content(&tree)?;
        Ok(self.content.get_or_init(|| loaded))
    }

    /// Id of the prior revision in the same state.
    pub fn previous_id(&self) -> DocumentResult<Option<ObjectId>> {
        Ok(self.header()?.previous)
    }

    /// Id of the revision this one was promoted from.
    pub fn origin_id(&self) -> DocumentResult<Option<ObjectId>> {
        Ok(self.header()?.origin)
    }

    /// The prior revision in the same state. For the first revision of a
    /// state this is the root revision (see [`Revision::is_root`]).
    pub fn previous(&self) -> DocumentResult<Option<Revision>> {
        Ok(self
            .previous_id()?
            .map(|id| self.neighbour(id, self.state.clone())))
    }

    /// The revision this one was promoted from.
    pub fn origin(&self) -> DocumentResult<Option<Revision>> {
        Ok(self.origin_id()?.map(|id| self.neighbour(id, None)))
    }

    fn neighbour(&self, id: ObjectId, state: Option<String>) -> Revision {
        Revision::from_id(Arc::clone(&self.repo), self.root, id, state)
    }

    /// What kind of revision this is, derived from its links.
    pub fn kind(&self) -> DocumentResult<RevisionKind> {
        let header = self.header()?;
        Ok(match (header.previous, header.origin) {
            (_, Some(_)) => RevisionKind::Promotion,
            (Some(_), None) => RevisionKind::Save,
            (None, None) => RevisionKind::Orphan,
        })
    }

    /// Persist the revision: content blob, tree, then commit. If `pointer` is
    /// given, the named state is moved to the new commit last, so a failure
    /// anywhere leaves every state untouched.
    ///
    /// Writing an already written revision returns its id and does nothing.
    pub fn write(&mut self, pointer: Option<&PointerUpdate>) -> DocumentResult<ObjectId> {
        if let Some(id) = self.id {
            return Ok(id);
        }
        let content = self
            .content
            .get()
            .ok_or_else(|| DocumentError::InvalidState("revision has no content".into()))?;
        let tree = self.repo.write_content(content)?;

        let header = self.header()?;
        let commit = CommitObject {
            tree,
            parents: header.previous.into_iter().chain(header.origin).collect(),
            author: header.author.clone(),
            message: header.message.clone(),
            timestamp: header.timestamp,
        };
        let id = self.repo.write_commit(&commit)?;

        if let Some(pointer) = pointer {
            self.repo.move_state(&pointer.state, pointer.expected, id)?;
        }
        if let Some(header) = self.header.get_mut() {
            header.tree = Some(tree);
        }
        self.id = Some(id);

        debug!(
            repository = %self.repo.name(),
            revision = %id.short_hex(),
            parents = commit.parents.len(),
            state = pointer.map(|p| p.state.as_str()).unwrap_or("-"),
            "wrote revision"
        );
        Ok(id)
    }

    /// Walk along `direction` links starting with this revision, returning
    /// `true` as soon as `test` accepts one. The walk ends at the root
    /// revision (which is never tested) or when the link runs out.
    pub fn has_ancestor<F>(&self, direction: Direction, mut test: F) -> DocumentResult<bool>
    where
        F: FnMut(&Revision) -> DocumentResult<bool>,
    {
        let mut current = Some(self.clone());
        while let Some(rev) = current {
            if rev.is_root() {
                break;
            }
            if test(&rev)? {
                return Ok(true);
            }
            current = match direction {
                Direction::Previous => rev.previous()?,
                Direction::Origin => rev.origin()?,
            };
        }
        Ok(false)
    }

    /// Was this revision ever promoted into state `to`?
    ///
    /// Starting at the tip of `to`, walk the previous links down to the root.
    /// For each revision on that walk, follow origin links back through the
    /// states it was promoted from, looking for this revision. The origin walk
    /// ends at the first revision without an origin, which in a
    /// master-first workflow is a revision saved in `master`.
    ///
    /// A revision saved directly into `to` is on the previous walk but never
    /// reached as an origin, so it does not count as promoted.
    pub fn has_been_promoted(&self, to: &str) -> DocumentResult<bool> {
        let Some(target) = self.id else {
            return Ok(false);
        };
        let Some(tip) = self.repo.state_target(to)? else {
            return Ok(false);
        };
        let tip = self.neighbour(tip, Some(to.to_string()));
        let promoted = promoted_into(&tip, &target)?;
        debug!(revision = %target.short_hex(), state = %to, promoted, "ancestry search");
        Ok(promoted)
    }
}

fn promoted_into(tip: &Revision, target: &ObjectId) -> DocumentResult<bool> {
    tip.has_ancestor(Direction::Previous, |step| match step.origin()? {
        Some(origin) => origin.has_ancestor(Direction::Origin, |o| Ok(o.id() == Some(*target))),
        None => Ok(false),
    })
}

impl std::fmt::Debug for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Revision")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;
    use vellum_refs::Ref;

    use crate::repository::ROOT_TAG;

    fn jane() -> Change {
        Change::new(Author::new("Jane", "jane@example.com"))
            .with_message("edit")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap())
    }

    /// A repository with a written root revision and its tag.
    fn repo_with_root() -> (Arc<Repository>, ObjectId) {
        let repo = Arc::new(Repository::in_memory("doc"));
        let mut root = Revision::create(
            Arc::clone(&repo),
            None,
            NewRevision::new(Content::empty(), Change::new(Author::system())),
        )
        .unwrap();
        let root_id = root.write(None).unwrap();
        repo.ref_store().create_ref(&Ref::tag(ROOT_TAG, root_id)).unwrap();
        (repo, root_id)
    }

    fn save(
        repo: &Arc<Repository>,
        root: ObjectId,
        state: &str,
        content: serde_json::Value,
    ) -> Revision {
        let expected = repo.state_target(state).unwrap();
        let new = NewRevision::new(Content::from(content), jane())
            .with_previous(expected.unwrap_or(root))
            .in_state(state);
        let mut rev = Revision::create(Arc::clone(repo), Some(root), new).unwrap();
        rev.write(Some(&PointerUpdate::new(state, expected))).unwrap();
        rev
    }

    fn promote(repo: &Arc<Repository>, root: ObjectId, from: &str, to: &str) -> Revision {
        let origin = repo.state_target(from).unwrap().unwrap();
        let expected = repo.state_target(to).unwrap();
        let source = Revision::from_id(Arc::clone(repo), Some(root), origin, None);
        let new = NewRevision::new(source.content().unwrap().clone(), jane())
            .with_previous(expected.unwrap_or(root))
            .with_origin(origin)
            .in_state(to);
        let mut rev = Revision::create(Arc::clone(repo), Some(root), new).unwrap();
        rev.write(Some(&PointerUpdate::new(to, expected))).unwrap();
        rev
    }

    // -----------------------------------------------------------------------
    // Creation and writing
    // -----------------------------------------------------------------------

    #[test]
    fn unwritten_revision_has_no_id() {
        let repo = Arc::new(Repository::in_memory("doc"));
        let rev = Revision::create(repo, None, NewRevision::new(Content::empty(), jane())).unwrap();
        assert!(rev.id().is_none());
        assert!(!rev.is_root());
        assert_eq!(rev.kind().unwrap(), RevisionKind::Orphan);
    }

    #[test]
    fn origin_without_previous_is_rejected() {
        let repo = Arc::new(Repository::in_memory("doc"));
        let new =
            NewRevision::new(Content::empty(), jane()).with_origin(ObjectId::from_bytes(b"o"));
        assert!(matches!(
            Revision::create(repo, None, new),
            Err(DocumentError::InvalidArgument(_))
        ));
    }

    #[test]
    fn write_is_idempotent() {
        let (repo, root) = repo_with_root();
        let mut rev = save(&repo, root, "master", json!({"title": "A"}));
        let before = repo.object_ids().unwrap().len();
        let id = rev.id().unwrap();

        assert_eq!(rev.write(None).unwrap(), id);
        assert_eq!(repo.object_ids().unwrap().len(), before);
    }

    #[test]
    fn write_links_parents_in_order() {
        let (repo, root) = repo_with_root();
        let r1 = save(&repo, root, "master", json!({"title": "A"}));
        let r2 = promote(&repo, root, "master", "published");

        let commit = repo.read_commit(&r2.id().unwrap()).unwrap();
        assert_eq!(commit.parents, vec![root, r1.id().unwrap()]);
        assert_eq!(r2.kind().unwrap(), RevisionKind::Promotion);
        assert_eq!(r1.kind().unwrap(), RevisionKind::Save);
    }

    #[test]
    fn failed_pointer_update_leaves_revision_unwritten() {
        let (repo, root) = repo_with_root();
        save(&repo, root, "master", json!({"n": 1}));

        // Pretend the state is still unset: create must fail.
        let new = NewRevision::new(Content::from(json!({"n": 2})), jane()).with_previous(root);
        let mut rev = Revision::create(Arc::clone(&repo), Some(root), new).unwrap();
        let err = rev.write(Some(&PointerUpdate::new("master", None))).unwrap_err();
        assert!(matches!(err, DocumentError::Conflict(_)));
        assert!(rev.id().is_none());
    }

    // -----------------------------------------------------------------------
    // Lazy loading
    // -----------------------------------------------------------------------

    #[test]
    fn bound_revision_loads_same_fields() {
        let (repo, root) = repo_with_root();
        let fresh = save(&repo, root, "master", json!({"title": "A", "n": 1.5}));

        let bound = Revision::from_id(Arc::clone(&repo), Some(root), fresh.id().unwrap(), None);
        assert_eq!(bound.content().unwrap(), fresh.content().unwrap());
        assert_eq!(bound.author().unwrap(), fresh.author().unwrap());
        assert_eq!(bound.message().unwrap(), fresh.message().unwrap());
        assert_eq!(bound.timestamp().unwrap(), fresh.timestamp().unwrap());
        assert_eq!(bound.previous_id().unwrap(), Some(root));
    }

    #[test]
    fn bound_revision_to_missing_commit_fails_loudly() {
        let (repo, root) = repo_with_root();
        let ghost = Revision::from_id(repo, Some(root), ObjectId::from_bytes(b"ghost"), None);
        assert!(matches!(ghost.author(), Err(DocumentError::NotFound(_))));
    }

    #[test]
    fn previous_of_first_revision_is_root() {
        let (repo, root) = repo_with_root();
        let r1 = save(&repo, root, "master", json!({"n": 1}));
        let prev = r1.previous().unwrap().unwrap();
        assert!(prev.is_root());
        assert_eq!(prev.kind().unwrap(), RevisionKind::Orphan);
        assert_eq!(prev.state(), Some("master"));
    }

    // -----------------------------------------------------------------------
    // Ancestry
    // -----------------------------------------------------------------------

    #[test]
    fn promoted_revision_is_found() {
        let (repo, root) = repo_with_root();
        let r1 = save(&repo, root, "master", json!({"title": "A"}));
        let r2 = save(&repo, root, "master", json!({"title": "B"}));
        promote(&repo, root, "master", "published");

        assert!(r2.has_been_promoted("published").unwrap());
        assert!(!r1.has_been_promoted("published").unwrap());
        assert!(!r2.has_been_promoted("archived").unwrap());
    }

    #[test]
    fn promotion_chains_are_followed_through_origins() {
        let (repo, root) = repo_with_root();
        let r1 = save(&repo, root, "master", json!({"v": 1}));
        let p1 = promote(&repo, root, "master", "published");
        promote(&repo, root, "published", "archived");

        assert!(r1.has_been_promoted("archived").unwrap());
        assert!(p1.has_been_promoted("archived").unwrap());
        assert!(r1.has_been_promoted("published").unwrap());
    }

    #[test]
    fn older_promotions_are_found_below_newer_ones() {
        let (repo, root) = repo_with_root();
        let r1 = save(&repo, root, "master", json!({"v": 1}));
        promote(&repo, root, "master", "published");
        let r2 = save(&repo, root, "master", json!({"v": 2}));
        let r3 = save(&repo, root, "master", json!({"v": 3}));
        promote(&repo, root, "master", "published");

        assert!(r1.has_been_promoted("published").unwrap());
        assert!(!r2.has_been_promoted("published").unwrap());
        assert!(r3.has_been_promoted("published").unwrap());
    }

    #[test]
    fn direct_save_into_state_is_not_a_promotion() {
        let (repo, root) = repo_with_root();
        let direct = save(&repo, root, "published", json!({"v": "direct"}));
        assert!(!direct.has_been_promoted("published").unwrap());
    }

    #[test]
    fn has_ancestor_never_tests_root() {
        let (repo, root) = repo_with_root();
        save(&repo, root, "master", json!({"v": 1}));
        let r2 = save(&repo, root, "master", json!({"v": 2}));

        let mut seen = Vec::new();
        let found = r2
            .has_ancestor(Direction::Previous, |r| {
                seen.push(r.id().unwrap());
                Ok(false)
            })
            .unwrap();
        assert!(!found);
        assert_eq!(seen.len(), 2);
        assert!(!seen.contains(&root));
    }
}
