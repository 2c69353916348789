use serde_json::json;
use std::sync::Arc;

use searchable_core::{
    Entity, Error, FieldValue, IndexStore, JsonRecord, LifecycleEvent, MemoryIndexStore, RelationObserver, Related,
    Searchable, SearchableColumns, SearchableRelation, SyncObserver, SyncOutcome, SyncSuppression,
};

fn post_columns() -> Arc<SearchableColumns> {
    Arc::new(SearchableColumns::new(&["title"], &["content", "author.name", "comments.author.email"]))
}

fn post(id: u64, title: &str, content: &str) -> JsonRecord {
    JsonRecord::new(
        "post",
        id,
        post_columns(),
        json!({
            "title": title,
            "content": content,
            "author": { "name": "Ann Smith" },
            "comments": [ { "author": { "email": "bob@example.com" } }, { "author": null } ]
        }),
    )
}

fn scoped_observer() -> SyncObserver<MemoryIndexStore> {
    SyncObserver::with_suppression(MemoryIndexStore::new(), Arc::new(SyncSuppression::new()))
}

#[test]
fn created_indexes_exactly_one_row_with_extracted_text() {
    let observer = scoped_observer();
    let record = post(1, "Hello World!", "Contact: x@y.com");

    let SyncOutcome::Indexed(row) = observer.created(&record).expect("created") else { panic!("expected an index row") };

    assert_eq!(row.title, "Hello World ");
    assert_eq!(row.content, "Contact x y com Ann Smith bob example com ");
    assert_eq!(row.title, record.index_title());
    assert_eq!(row.content, record.index_content());
    assert_eq!(observer.store().count().expect("count"), 1);
    assert_eq!(record.indexed_record(observer.store()).expect("find"), Some(row));
}

#[test]
fn updates_are_idempotent_and_keep_identity() {
    let observer = scoped_observer();
    let mut record = post(7, "Title", "Body");
    let SyncOutcome::Indexed(first) = observer.created(&record).expect("created") else { panic!("expected an index row") };
    let SyncOutcome::Indexed(again) = observer.updated(&record).expect("updated") else { panic!("expected an index row") };

    assert_eq!(again.id, first.id);
    assert_eq!(again.created_at, first.created_at);
    assert_eq!((again.title.as_str(), again.content.as_str()), (first.title.as_str(), first.content.as_str()));

    record.value_mut()["title"] = json!("Renamed, title");
    let SyncOutcome::Indexed(changed) = observer.updated(&record).expect("updated") else { panic!("expected an index row") };
    assert_eq!(changed.id, first.id);
    assert_eq!(changed.title, "Renamed title");
    assert_eq!(observer.store().count().expect("count"), 1);
}

#[test]
fn delete_removes_row_and_repeated_delete_is_noop() {
    let observer = scoped_observer();
    let record = post(3, "Doomed", "soon gone");
    observer.created(&record).expect("created");

    assert_eq!(observer.deleted(&record).expect("deleted"), SyncOutcome::Removed);
    assert_eq!(observer.store().count().expect("count"), 0);
    assert_eq!(observer.deleted(&record).expect("deleted again"), SyncOutcome::NotIndexed);
}

#[test]
fn restore_reindexes_deleted_record() {
    let observer = scoped_observer();
    let record = post(4, "Back", "again");
    observer.created(&record).expect("created");
    observer.deleted(&record).expect("deleted");

    let outcome = observer.handle(LifecycleEvent::Restored, &record).expect("restored");
    assert!(matches!(outcome, SyncOutcome::Indexed(ref row) if row.title == "Back"));
    assert_eq!(observer.store().count().expect("count"), 1);
}

#[test]
fn suppressed_type_is_left_untouched_until_reenabled() {
    let observer = scoped_observer();
    let record = post(5, "Quiet", "bulk load");
    observer.created(&record).expect("created");

    observer.suppression().disable_for("post");
    let mut edited = record.clone();
    edited.value_mut()["title"] = json!("Changed");
    assert_eq!(observer.updated(&edited).expect("updated"), SyncOutcome::Suppressed);
    assert_eq!(observer.deleted(&edited).expect("deleted"), SyncOutcome::Suppressed);
    assert_eq!(observer.created(&post(6, "New", "row")).expect("created"), SyncOutcome::Suppressed);
    let stored = observer.store().records();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Quiet");

    observer.suppression().enable_for("post");
    let SyncOutcome::Indexed(row) = observer.updated(&edited).expect("updated") else { panic!("expected an index row") };
    assert_eq!(row.title, "Changed");
}

#[test]
fn suppression_is_per_type() {
    let observer = scoped_observer();
    observer.suppression().disable_for("page");
    assert!(matches!(observer.created(&post(1, "a", "b")).expect("created"), SyncOutcome::Indexed(_)));
}

#[test]
fn global_suppression_is_shared_between_observers() {
    let columns = Arc::new(SearchableColumns::new(&["title"], &[] as &[&str]));
    let record = JsonRecord::new("global_suppression_probe", 1, columns, json!({ "title": "probe" }));
    let first = SyncObserver::new(MemoryIndexStore::new());
    let second = SyncObserver::new(MemoryIndexStore::new());

    SyncSuppression::global().disable_for("global_suppression_probe");
    assert_eq!(second.created(&record).expect("created"), SyncOutcome::Suppressed);
    first.suppression().enable_for("global_suppression_probe");
    assert!(matches!(second.created(&record).expect("created"), SyncOutcome::Indexed(_)));
}

#[test]
fn direct_index_operations_ignore_suppression() {
    let observer = scoped_observer();
    observer.suppression().disable_for("post");
    let record = post(8, "Direct", "call");
    observer.index_record(&record).expect("indexed");
    assert_eq!(observer.store().count().expect("count"), 1);
    assert!(observer.unindex_record(&record).expect("unindexed"));
}

struct Comment<'a> {
    relation: Option<&'static str>,
    body: &'static str,
    post: Option<&'a JsonRecord>,
}

impl Entity for Comment<'_> {
    fn field(&self, name: &str) -> Option<FieldValue> { (name == "body").then(|| FieldValue::from(self.body)) }

    fn related(&self, name: &str) -> Related<'_> {
        match (name, self.post) {
            ("post", Some(post)) => Related::One(post),
            ("raw", _) => Related::One(&RAW_PARENT),
            _ => Related::Absent,
        }
    }
}

impl SearchableRelation for Comment<'_> {
    fn searchable_relation_name(&self) -> Option<&str> { self.relation }
}

static RAW_PARENT: serde_json::Value = serde_json::Value::Null;

#[test]
fn relation_event_refreshes_parent_index() {
    let observer = scoped_observer();
    let relations = RelationObserver::new(&observer);
    let parent = post(10, "Parent", "text");
    let comment = Comment { relation: Some("post"), body: "hi", post: Some(&parent) };

    for event in [LifecycleEvent::Created, LifecycleEvent::Updated, LifecycleEvent::Deleted, LifecycleEvent::Restored] {
        let outcome = relations.handle(event, &comment).expect("forwarded");
        assert!(matches!(outcome, SyncOutcome::Indexed(ref row) if row.key == parent.record_key()), "{event}");
    }
    assert_eq!(observer.store().count().expect("count"), 1);
}

#[test]
fn relation_misconfiguration_is_fatal() {
    let observer = scoped_observer();
    let relations = RelationObserver::new(&observer);
    let parent = post(11, "Parent", "text");

    let unset = Comment { relation: None, body: "x", post: Some(&parent) };
    assert!(matches!(relations.handle(LifecycleEvent::Updated, &unset), Err(Error::RelationNotFound(_))));

    let missing_parent = Comment { relation: Some("post"), body: "x", post: None };
    let err = relations.handle(LifecycleEvent::Updated, &missing_parent).expect_err("no parent");
    assert!(matches!(err, Error::RelationNotFound(ref name) if name == "post"));

    let not_searchable = Comment { relation: Some("raw"), body: "x", post: None };
    assert!(matches!(relations.handle(LifecycleEvent::Created, &not_searchable), Err(Error::RelationNotFound(_))));

    assert_eq!(observer.store().count().expect("count"), 0);
}
