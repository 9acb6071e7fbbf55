//! End-to-end behaviour of the save / promote workflow on in-memory storage.

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use vellum_document::{
    Author, Change, Content, Document, DocumentError, Revision, RevisionKind, Storage, MASTER,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn jane(message: &str, minute: i64) -> Change {
    Change::new(Author::new("Jane Doe", "jane@example.com"))
        .with_message(message)
        .with_timestamp(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap() + Duration::minutes(minute),
        )
}

fn title(revision: &Revision) -> String {
    revision
        .content()
        .unwrap()
        .get("title")
        .and_then(Content::as_str)
        .unwrap_or_default()
        .to_string()
}

#[test]
fn example_scenario() {
    init_tracing();
    let storage = Storage::in_memory().unwrap();
    let mut d = Document::with_id(&storage, "d", "article", Content::from(json!({"title": "A"})))
        .unwrap();

    let r1 = d.save(jane("first", 0)).unwrap();
    d.set_content(Content::from(json!({"title": "B"})));
    let r2 = d.save(jane("second", 1)).unwrap();
    assert_eq!(r2.previous().unwrap().unwrap().id(), r1.id());

    let r3 = d.promote(MASTER, "published", jane("publish", 2)).unwrap();
    assert_eq!(r3.origin().unwrap().unwrap().id(), r2.id());
    let root = d.revisions().root_revision().unwrap().unwrap();
    assert_eq!(r3.previous().unwrap().unwrap().id(), root.id());
    assert_eq!(title(&r3), "B");

    assert!(d.has_been_promoted("published", r2.id().as_ref()).unwrap());
    assert!(!d.has_been_promoted("published", r1.id().as_ref()).unwrap());
}

#[test]
fn root_is_unique_and_ends_every_timeline_once() {
    init_tracing();
    let storage = Storage::in_memory().unwrap();
    let mut doc = Document::new(&storage, "article", Content::from(json!({"title": "A"}))).unwrap();
    doc.save(jane("one", 0)).unwrap();
    doc.save(jane("two", 1)).unwrap();
    doc.promote(MASTER, "review", jane("review", 2)).unwrap();
    doc.promote("review", "published", jane("publish", 3)).unwrap();
    doc.save_in("scratch", jane("scratch", 4)).unwrap();

    let root = doc.revisions().root_id().unwrap().unwrap();
    let tags = doc.repository().ref_store().tags().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].1.target(), root);

    for state in doc.states().unwrap() {
        let mut current = doc.revisions().state(&state).unwrap();
        let mut root_visits = 0;
        while let Some(rev) = current {
            if rev.is_root() {
                root_visits += 1;
            }
            current = rev.previous().unwrap();
        }
        assert_eq!(root_visits, 1, "timeline of {state} must end at the root once");
    }
}

#[test]
fn history_is_complete_and_linked() {
    init_tracing();
    let storage = Storage::in_memory().unwrap();
    let mut doc = Document::new(&storage, "article", Content::empty()).unwrap();
    let n = 7;
    for i in 0..n {
        doc.content_mut().set("title", format!("v{i}")).unwrap();
        doc.save(jane(&format!("save {i}"), i)).unwrap();
    }

    let history: Vec<Revision> = doc.history(MASTER).collect::<Result<_, _>>().unwrap();
    assert_eq!(history.len(), n as usize);
    for pair in history.windows(2) {
        assert_eq!(pair[0].previous_id().unwrap(), pair[1].id());
    }
    assert_eq!(title(&history[0]), "v6");
    assert_eq!(title(&history[6]), "v0");

    // History re-reads the pointer on every call.
    doc.save(jane("one more", 100)).unwrap();
    assert_eq!(doc.history(MASTER).count(), n as usize + 1);
}

#[test]
fn history_from_revision_id() {
    let storage = Storage::in_memory().unwrap();
    let mut doc = Document::new(&storage, "article", Content::empty()).unwrap();
    doc.save(jane("one", 0)).unwrap();
    let r2 = doc.save(jane("two", 1)).unwrap();
    doc.save(jane("three", 2)).unwrap();

    let from_r2: Vec<_> = doc
        .history(&r2.id().unwrap().to_hex())
        .map(|r| r.unwrap().message().unwrap().to_string())
        .collect();
    assert_eq!(from_r2, vec!["two", "one"]);
}

#[test]
fn lazily_loaded_revision_matches_written_one() {
    init_tracing();
    let storage = Storage::in_memory().unwrap();
    let mut doc = Document::new(
        &storage,
        "article",
        Content::from(json!({"title": "A", "tags": ["x", "y"], "n": 3})),
    )
    .unwrap();
    let written = doc.save(jane("lazy", 0)).unwrap();

    let loaded = doc.history(MASTER).next().unwrap().unwrap();
    assert_eq!(loaded.id(), written.id());
    assert_eq!(loaded.content().unwrap(), written.content().unwrap());
    assert_eq!(loaded.author().unwrap(), written.author().unwrap());
    assert_eq!(loaded.message().unwrap(), written.message().unwrap());
    assert_eq!(loaded.timestamp().unwrap(), written.timestamp().unwrap());
    assert_eq!(loaded.kind().unwrap(), RevisionKind::Save);
}

#[test]
fn registration_is_idempotent() {
    let storage = Storage::in_memory().unwrap();
    let index = storage.document_index();
    assert!(index.list_all().unwrap().is_empty());

    assert!(index.register("alpha", "article").unwrap());
    let after_first = index.list_all().unwrap();
    assert!(index.register("alpha", "article").unwrap());
    assert!(index.register("alpha", "page").unwrap());
    assert_eq!(index.list_all().unwrap(), after_first);
    assert_eq!(index.lookup("alpha").unwrap().unwrap().doc_type, "article");

    // Saving registers through the same index.
    let mut doc = Document::with_id(&storage, "beta", "page", Content::empty()).unwrap();
    doc.save(jane("one", 0)).unwrap();
    doc.save(jane("two", 1)).unwrap();
    let names: Vec<_> = index.list_all().unwrap().into_iter().map(|e| e.name).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[test]
fn save_into_unpromoted_state_is_not_a_promotion() {
    init_tracing();
    let storage = Storage::in_memory().unwrap();
    let mut doc = Document::new(&storage, "article", Content::from(json!({"title": "A"}))).unwrap();
    let m1 = doc.save(jane("master", 0)).unwrap();

    doc.set_content(Content::from(json!({"title": "hotfix"})));
    let direct = doc.save_in("published", jane("direct", 1)).unwrap();
    assert!(direct.previous().unwrap().unwrap().is_root());
    assert!(direct.origin().unwrap().is_none());

    // Neither the direct save nor the master revision reached published by
    // promotion.
    assert!(!doc.has_been_promoted("published", direct.id().as_ref()).unwrap());
    assert!(!doc.has_been_promoted("published", m1.id().as_ref()).unwrap());

    // A later promotion stacks on top of the direct save and is found.
    doc.promote(MASTER, "published", jane("publish", 2)).unwrap();
    assert!(doc.has_been_promoted("published", m1.id().as_ref()).unwrap());
    assert!(!doc.has_been_promoted("published", direct.id().as_ref()).unwrap());

    let published: Vec<_> = doc
        .history("published")
        .map(|r| r.unwrap().kind().unwrap())
        .collect();
    assert_eq!(published, vec![RevisionKind::Promotion, RevisionKind::Save]);
}

#[test]
fn promotion_of_unrelated_document_revision_is_false() {
    let storage = Storage::in_memory().unwrap();
    let mut a = Document::new(&storage, "article", Content::from(json!({"k": "a"}))).unwrap();
    let mut b = Document::new(&storage, "article", Content::from(json!({"k": "b"}))).unwrap();
    a.save(jane("a", 0)).unwrap();
    let other = b.save(jane("b", 0)).unwrap();
    a.promote(MASTER, "published", jane("publish", 1)).unwrap();

    assert!(!a.has_been_promoted("published", other.id().as_ref()).unwrap());
}

#[test]
fn second_handle_builds_on_latest_tip() {
    let storage = Storage::in_memory().unwrap();
    let mut first = Document::with_id(&storage, "shared", "article", Content::empty()).unwrap();
    first.save(jane("one", 0)).unwrap();

    let mut second = Document::open(&storage, "shared", None).unwrap().unwrap();
    first.save(jane("two", 1)).unwrap();
    second.save(jane("three", 2)).unwrap();

    // Both handles resolve the current tip before writing, so the second save
    // builds on the first handle's work rather than overwriting it.
    let messages: Vec<_> = first
        .history(MASTER)
        .map(|r| r.unwrap().message().unwrap().to_string())
        .collect();
    assert_eq!(messages, vec!["three", "two", "one"]);
}

#[test]
fn invalid_states_are_arguments_not_missing() {
    let storage = Storage::in_memory().unwrap();
    let mut doc = Document::new(&storage, "article", Content::empty()).unwrap();
    doc.save(jane("one", 0)).unwrap();

    assert!(doc.revisions().state("never-used").unwrap().is_none());
    assert!(matches!(
        doc.revisions().state("no spaces"),
        Err(DocumentError::InvalidArgument(_))
    ));
    assert!(matches!(
        doc.promote(MASTER, "bad..state", jane("p", 1)),
        Err(DocumentError::InvalidArgument(_))
    ));
}
