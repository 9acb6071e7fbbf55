use crate::collection::RevisionCollection;
use crate::error::DocumentResult;
use crate::revision::Revision;

enum Cursor {
    Start(String),
    At(Revision),
    Done,
}

/// Lazy walk over a state's timeline, newest first.
///
/// Yields each revision from the resolved tip along previous links and stops
/// before the root revision. An error ends the walk after it is yielded.
pub struct History<'a> {
    revisions: &'a RevisionCollection,
    cursor: Cursor,
}

impl<'a> History<'a> {
    pub(crate) fn new(revisions: &'a RevisionCollection, name_or_id: &str) -> Self {
        Self {
            revisions,
            cursor: Cursor::Start(name_or_id.to_string()),
        }
    }

    fn step(&mut self) -> DocumentResult<Option<Revision>> {
        let current = match std::mem::replace(&mut self.cursor, Cursor::Done) {
            Cursor::Start(name) => match self.revisions.lookup(&name)? {
                Some(rev) => rev,
                None => return Ok(None),
            },
            Cursor::At(rev) => rev,
            Cursor::Done => return Ok(None),
        };
        if current.is_root() {
            return Ok(None);
        }
        if let Some(previous) = current.previous()? {
            self.cursor = Cursor::At(previous);
        }
        Ok(Some(current))
    }
}

impl Iterator for History<'_> {
    type Item = DocumentResult<Revision>;

    fn next(&mut self) -> Option<Self::Item> {
        self.step().transpose()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use vellum_refs::Ref;
    use vellum_types::{Author, Content, ObjectId};

    use crate::repository::{Repository, ROOT_TAG};
    use crate::revision::{Change, NewRevision, PointerUpdate, Revision};

    use super::*;

    fn setup() -> (Arc<Repository>, RevisionCollection, ObjectId) {
        let repo = Arc::new(Repository::in_memory("doc"));
        let mut root = Revision::create(
            Arc::clone(&repo),
            None,
            NewRevision::new(Content::empty(), Change::new(Author::system())),
        )
        .unwrap();
        let root_id = root.write(None).unwrap();
        repo.ref_store().create_ref(&Ref::tag(ROOT_TAG, root_id)).unwrap();
        let revisions = RevisionCollection::new(Arc::clone(&repo));
        (repo, revisions, root_id)
    }

    fn save(repo: &Arc<Repository>, root: ObjectId, state: &str, n: i64) -> ObjectId {
        let expected = repo.state_target(state).unwrap();
        let change =
            Change::new(Author::new("a", "a@example.com")).with_message(format!("save {n}"));
        let new = NewRevision::new(Content::from(json!({ "n": n })), change)
            .with_previous(expected.unwrap_or(root));
        let mut rev = Revision::create(Arc::clone(repo), Some(root), new).unwrap();
        rev.write(Some(&PointerUpdate::new(state, expected))).unwrap()
    }

    #[test]
    fn walks_newest_first_and_skips_root() {
        let (repo, revisions, root) = setup();
        let ids: Vec<ObjectId> = (1..=3).map(|n| save(&repo, root, "master", n)).collect();

        let walked: Vec<ObjectId> = revisions
            .history("master")
            .map(|r| r.unwrap().id().unwrap())
            .collect();
        assert_eq!(walked, ids.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn unknown_state_is_empty() {
        let (_repo, revisions, _root) = setup();
        assert_eq!(revisions.history("published").count(), 0);
    }

    #[test]
    fn history_from_a_revision_id() {
        let (repo, revisions, root) = setup();
        let first = save(&repo, root, "master", 1);
        save(&repo, root, "master", 2);

        let walked: Vec<_> = revisions.history(&first.to_hex()).collect();
        assert_eq!(walked.len(), 1);
    }

    #[test]
    fn restarts_from_the_stored_pointer() {
        let (repo, revisions, root) = setup();
        save(&repo, root, "master", 1);
        let history = revisions.history("master");
        // Not resolved yet: a save before iteration is included.
        save(&repo, root, "master", 2);
        assert_eq!(history.count(), 2);
        save(&repo, root, "master", 3);
        assert_eq!(revisions.history("master").count(), 3);
    }

    #[test]
    fn missing_commit_surfaces_as_error() {
        let (repo, revisions, _root) = setup();
        repo.ref_store()
            .create_ref(&Ref::state("broken", ObjectId::from_bytes(b"dangling")))
            .unwrap();
        let mut history = revisions.history("broken");
        // The tip itself is bound lazily; following its previous link fails.
        assert!(history.next().unwrap().is_err());
        assert!(history.next().is_none());
    }
}
