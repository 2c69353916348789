//! searchable-core
//!
//! Keeps a derived full-text index row per source record in step with the
//! record's lifecycle and builds weighted relevance searches over it. See
//! `observer` for synchronization and `query` for search construction.

pub mod cleaner;
pub mod column;
pub mod config;
pub mod error;
pub mod extract;
pub mod json;
pub mod memory;
pub mod mode;
pub mod observer;
pub mod query;
pub mod reindex;
pub mod traits;
pub mod types;
pub mod weights;

pub use cleaner::{CleanerRegistry, EmailCleaner, KeywordCleaner};
pub use column::{Column, RelationPath, SearchableColumns};
pub use config::SearchableConfig;
pub use error::{Error, Result};
pub use extract::TextExtractor;
pub use json::{JsonRecord, JsonRecordSet};
pub use memory::MemoryIndexStore;
pub use mode::SearchMode;
pub use observer::{LifecycleEvent, RelationObserver, SyncObserver, SyncOutcome, SyncSuppression};
pub use query::{Ranked, SearchQuery, SearchQueryBuilder, SortDirection, SourceTable, SqlStatement};
pub use reindex::{BatchReport, Reindexer};
pub use traits::{Entity, FullTextEngine, IndexStore, MatchRequest, RecordSource, Searchable, SearchableRelation};
pub use types::{FieldValue, IndexRecord, MatchScore, RecordId, RecordKey, Related};
pub use weights::{SearchWeights, Weight};
