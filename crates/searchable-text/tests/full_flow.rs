use std::sync::Arc;

use searchable_core::{
    FullTextEngine, IndexStore, JsonRecordSet, MatchRequest, RecordKey, Reindexer, SearchMode, SearchQueryBuilder,
    SearchWeights, SearchableConfig, SourceTable, SortDirection, SyncObserver, SyncSuppression, Weight,
};
use searchable_text::{TantivyIndexStore, TantivySearchEngine};

const FIXTURE: &str = r#"{
    "types": {
        "post": { "title": ["title"], "content": ["body", "author.email"] },
        "page": { "title": ["title"], "content": ["body"] }
    },
    "records": {
        "post": [
            { "id": 1, "title": "Hello World!", "body": "Contact:", "author": { "email": "x@y.com" } },
            { "id": 2, "title": "Other", "body": "nothing here", "author": null },
            { "id": 3, "title": "Database tuning", "body": "mysql indexes", "author": null },
            { "id": 4, "title": "Indexes explained", "body": "btree layout", "author": null }
        ],
        "page": [
            { "id": 1, "title": "Hello page", "body": "static" }
        ]
    }
}"#;

fn indexed(records: &JsonRecordSet) -> SyncObserver<TantivyIndexStore> {
    let store = TantivyIndexStore::in_memory().expect("store");
    let observer = SyncObserver::with_suppression(store, Arc::new(SyncSuppression::new()));
    for record_type in ["post", "page"] {
        let source = records.source(record_type).expect("source");
        Reindexer::new(&observer).index_all(&source, None).expect("reindex");
    }
    observer
}

fn ids(builder: &SearchQueryBuilder, engine: &TantivySearchEngine, records: &JsonRecordSet, keywords: &str, mode: Option<SearchMode>) -> Vec<u64> {
    builder
        .search(SourceTable::new("post", "posts"), keywords, mode)
        .execute(engine, records.records("post"))
        .expect("search")
        .into_iter()
        .map(|hit| hit.record.value()["id"].as_u64().expect("id"))
        .collect()
}

#[test]
fn hello_world_round_trip() {
    let records = JsonRecordSet::from_json_str(FIXTURE).expect("fixture");
    let observer = indexed(&records);
    let engine = observer.store().search_engine();
    let builder = SearchQueryBuilder::from_config(&SearchableConfig::default()).expect("builder");

    let row = observer.store().find(&RecordKey::new("post", 1)).expect("find").expect("row");
    assert_eq!(row.title, "Hello World ");
    assert_eq!(row.content, "Contact x y com");
    assert_eq!(observer.store().count().expect("count"), 5);

    let hits = builder
        .search(SourceTable::new("post", "posts"), "Hello", None)
        .execute(&engine, records.records("post"))
        .expect("search");
    assert_eq!(hits.len(), 1);
    assert!(hits[0].score > 0.0);
    assert!(ids(&builder, &engine, &records, "nomatch", None).is_empty());
    assert!(ids(&builder, &engine, &records, "   ", None).is_empty());
}

#[test]
fn boolean_mode_cleans_email_keywords() {
    let records = JsonRecordSet::from_json_str(FIXTURE).expect("fixture");
    let observer = indexed(&records);
    let engine = observer.store().search_engine();
    let builder = SearchQueryBuilder::from_config(&SearchableConfig::default()).expect("builder");

    let query = builder.search(SourceTable::new("post", "posts"), "x@y.com", Some(SearchMode::Boolean));
    assert_eq!(query.keywords, "x y.com");
    assert_eq!(ids(&builder, &engine, &records, "x@y.com", Some(SearchMode::Boolean)), vec![1]);
    assert_eq!(ids(&builder, &engine, &records, "+hello -world", Some(SearchMode::Boolean)), Vec::<u64>::new());
    assert_eq!(ids(&builder, &engine, &records, "+indexes -btree", Some(SearchMode::Boolean)), vec![3]);
}

#[test]
fn boolean_exclusions_alone_match_nothing() {
    let records = JsonRecordSet::from_json_str(FIXTURE).expect("fixture");
    let observer = indexed(&records);
    let engine = observer.store().search_engine();
    let builder = SearchQueryBuilder::from_config(&SearchableConfig::default()).expect("builder");

    assert_eq!(ids(&builder, &engine, &records, "-btree", Some(SearchMode::Boolean)), Vec::<u64>::new());
    assert_eq!(ids(&builder, &engine, &records, "-btree -\"hello world\"", Some(SearchMode::Boolean)), Vec::<u64>::new());
    assert_eq!(ids(&builder, &engine, &records, "-index*", Some(SearchMode::Boolean)), Vec::<u64>::new());
    assert_eq!(ids(&builder, &engine, &records, "mysql -btree", Some(SearchMode::Boolean)), vec![3]);
}

#[test]
fn boolean_trailing_star_matches_prefixes() {
    let records = JsonRecordSet::from_json_str(FIXTURE).expect("fixture");
    let observer = indexed(&records);
    let engine = observer.store().search_engine();
    let builder = SearchQueryBuilder::from_config(&SearchableConfig::default()).expect("builder");

    assert_eq!(ids(&builder, &engine, &records, "datab*", Some(SearchMode::Boolean)), vec![3]);
    assert_eq!(ids(&builder, &engine, &records, "Datab*", Some(SearchMode::Boolean)), vec![3]);
    let mut both = ids(&builder, &engine, &records, "index*", Some(SearchMode::Boolean));
    both.sort_unstable();
    assert_eq!(both, vec![3, 4]);
    assert_eq!(ids(&builder, &engine, &records, "index* -btree", Some(SearchMode::Boolean)), vec![3]);
    assert_eq!(ids(&builder, &engine, &records, "+datab* -mysql", Some(SearchMode::Boolean)), Vec::<u64>::new());
    assert_eq!(ids(&builder, &engine, &records, "+hello -wor*", Some(SearchMode::Boolean)), Vec::<u64>::new());
}

#[test]
fn matching_is_restricted_to_the_record_type() {
    let records = JsonRecordSet::from_json_str(FIXTURE).expect("fixture");
    let observer = indexed(&records);
    let engine = observer.store().search_engine();

    let request = MatchRequest { record_type: "page", keywords: "hello", mode: None };
    let scores = engine.match_scores(&request).expect("scores");
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].record_id, 1);
    assert!(scores[0].title_score > 0.0);
}

#[test]
fn query_expansion_widens_matches() {
    let records = JsonRecordSet::from_json_str(FIXTURE).expect("fixture");
    let observer = indexed(&records);
    let engine = observer.store().search_engine();
    let builder = SearchQueryBuilder::from_config(&SearchableConfig::default()).expect("builder");

    assert_eq!(ids(&builder, &engine, &records, "database", Some(SearchMode::NaturalLanguage)), vec![3]);
    let expanded = ids(&builder, &engine, &records, "database", Some(SearchMode::QueryExpansion));
    assert_eq!(expanded[0], 3);
    assert!(expanded.contains(&4));
}

#[test]
fn title_weight_decides_ranking() {
    let records = JsonRecordSet::from_json_str(
        r#"{
            "types": { "post": { "title": ["title"], "content": ["body"] } },
            "records": { "post": [
                { "id": 1, "title": "Rust guide", "body": "intro" },
                { "id": 2, "title": "Cooking", "body": "rust rust rust" }
            ] }
        }"#,
    )
    .expect("fixture");
    let observer = indexed_single(&records);
    let engine = observer.store().search_engine();

    let weighted = SearchQueryBuilder::from_config(&SearchableConfig::default()).expect("builder");
    assert_eq!(ids(&weighted, &engine, &records, "rust", None), vec![1, 2]);

    let content_only = SearchWeights { title: Weight::new(0.0).expect("weight"), content: Weight::new(1.0).expect("weight") };
    let config = SearchableConfig { weight: content_only, ..SearchableConfig::default() };
    let builder = SearchQueryBuilder::from_config(&config).expect("builder");
    assert_eq!(ids(&builder, &engine, &records, "rust", None), vec![2, 1]);

    let ascending: Vec<u64> = builder
        .search(SourceTable::new("post", "posts"), "rust", None)
        .order(SortDirection::Asc)
        .execute(&engine, records.records("post"))
        .expect("search")
        .into_iter()
        .map(|hit| hit.record.value()["id"].as_u64().expect("id"))
        .collect();
    assert_eq!(ascending, vec![1, 2]);
}

fn indexed_single(records: &JsonRecordSet) -> SyncObserver<TantivyIndexStore> {
    let observer = SyncObserver::with_suppression(TantivyIndexStore::in_memory().expect("store"), Arc::new(SyncSuppression::new()));
    Reindexer::new(&observer).index_all(&records.source("post").expect("source"), None).expect("reindex");
    observer
}

#[test]
fn deleted_records_stop_matching() {
    let records = JsonRecordSet::from_json_str(FIXTURE).expect("fixture");
    let observer = indexed(&records);
    let engine = observer.store().search_engine();
    let builder = SearchQueryBuilder::from_config(&SearchableConfig::default()).expect("builder");

    let post = records.find("post", 1).expect("post");
    observer.deleted(post).expect("deleted");
    assert!(ids(&builder, &engine, &records, "hello", None).is_empty());
    observer.restored(post).expect("restored");
    assert_eq!(ids(&builder, &engine, &records, "hello", None), vec![1]);
}

#[test]
fn on_disk_index_survives_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let records = JsonRecordSet::from_json_str(FIXTURE).expect("fixture");
    {
        let store = TantivyIndexStore::open(Some(dir.path())).expect("store");
        let observer = SyncObserver::with_suppression(store, Arc::new(SyncSuppression::new()));
        Reindexer::new(&observer).index_all(&records.source("post").expect("source"), Some(1)).expect("reindex");
    }

    let store = TantivyIndexStore::open(Some(dir.path())).expect("reopen");
    assert_eq!(store.count().expect("count"), 1);
    let row = store.find(&RecordKey::new("post", 1)).expect("find").expect("row");
    assert_eq!(row.id, Some(1));

    let observer = SyncObserver::with_suppression(store, Arc::new(SyncSuppression::new()));
    let next = observer.index_record(records.find("post", 2).expect("post")).expect("index");
    assert_eq!(next.id, Some(2));

    drop(observer);
    let engine = TantivySearchEngine::open_in_dir(dir.path()).expect("engine");
    let scores = engine.match_scores(&MatchRequest { record_type: "post", keywords: "hello", mode: None }).expect("scores");
    assert_eq!(scores.len(), 1);
}
