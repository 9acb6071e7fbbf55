//! Property-based tests for the revision graph.
//!
//! Random sequences of saves and promotions must keep `master` linear and
//! every promotion discoverable from its target state.

use proptest::prelude::*;
use serde_json::json;

use vellum_document::{Author, Change, Content, Document, ObjectId, Storage, MASTER};

const STATES: [&str; 3] = ["review", "published", "archived"];

#[derive(Clone, Debug)]
enum Step {
    Save(String),
    Promote { from: usize, to: usize },
}

/// Strategy for one workflow step. Index 0 stands for `master` as a source.
fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => "[a-z]{0,8}".prop_map(Step::Save),
        1 => (0..=STATES.len(), 0..STATES.len()).prop_map(|(from, to)| Step::Promote { from, to }),
    ]
}

fn source_state(from: usize) -> &'static str {
    if from == 0 {
        MASTER
    } else {
        STATES[from - 1]
    }
}

fn author() -> Change {
    Change::new(Author::new("Prop", "prop@example.com"))
}

proptest! {
    /// Each save into master links to the previous save, starting at the root.
    #[test]
    fn master_only_moves_forward(titles in prop::collection::vec("[a-zA-Z0-9 ]{0,12}", 1..12)) {
        let storage = Storage::in_memory().unwrap();
        let mut doc = Document::new(&storage, "article", Content::empty()).unwrap();

        let mut expected_previous: Option<ObjectId> = None;
        for title in &titles {
            doc.set_content(Content::from(json!({ "title": title })));
            let revision = doc.save(author()).unwrap();
            let previous = revision.previous().unwrap().unwrap();
            match expected_previous {
                Some(id) => {
                    prop_assert_eq!(previous.id(), Some(id));
                }
                None => {
                    prop_assert!(previous.is_root());
                }
            }
            expected_previous = revision.id();
        }

        prop_assert_eq!(doc.history(MASTER).count(), titles.len());
    }

    /// Whatever happens afterwards, the tip promoted into a state stays
    /// promoted into it, and master revisions saved after every promotion
    /// never count as promoted.
    #[test]
    fn promotions_stay_discoverable(steps in prop::collection::vec(step(), 1..16)) {
        let storage = Storage::in_memory().unwrap();
        let mut doc = Document::new(&storage, "article", Content::empty()).unwrap();
        let mut promoted: Vec<(ObjectId, &'static str)> = Vec::new();
        let mut master_saves = 0usize;

        for step in &steps {
            match step {
                Step::Save(title) => {
                    doc.set_content(Content::from(json!({ "title": title })));
                    doc.save(author()).unwrap();
                    master_saves += 1;
                }
                Step::Promote { from, to } => {
                    let from = source_state(*from);
                    let to = STATES[*to];
                    if from == to {
                        continue;
                    }
                    let Some(tip) = doc.revisions().state(from).unwrap() else {
                        continue;
                    };
                    doc.promote(from, to, author()).unwrap();
                    promoted.push((tip.id().unwrap(), to));
                }
            }
        }

        for (id, to) in &promoted {
            prop_assert!(doc.has_been_promoted(to, Some(id)).unwrap());
        }
        prop_assert_eq!(doc.history(MASTER).count(), master_saves);

        let last = doc.save(author()).unwrap().id().unwrap();
        for state in STATES {
            prop_assert!(!doc.has_been_promoted(state, Some(&last)).unwrap());
        }
    }
}
