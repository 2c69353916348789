use std::sync::Arc;

use crate::column::SearchableColumns;
use crate::error::Result;
use crate::extract::TextExtractor;
use crate::mode::SearchMode;
use crate::types::{FieldValue, IndexRecord, MatchScore, RecordId, RecordKey, Related};

/// Read access to a record's scalar fields and named relations.
pub trait Entity {
    /// `None` when the entity has no such field.
    fn field(&self, name: &str) -> Option<FieldValue>;

    fn related(&self, name: &str) -> Related<'_>;

    /// Entities enrolled in indexing return themselves here so relation
    /// observers can reach them through a parent accessor.
    fn as_searchable(&self) -> Option<&dyn Searchable> { None }
}

/// A source record enrolled in the search index.
pub trait Searchable: Entity {
    /// Stable type discriminator stored on the index row.
    fn record_type(&self) -> &str;

    fn record_id(&self) -> RecordId;

    fn searchable_columns(&self) -> &SearchableColumns;

    fn record_key(&self) -> RecordKey { RecordKey::new(self.record_type(), self.record_id()) }

    fn index_title(&self) -> String { TextExtractor::extract(self, &self.searchable_columns().title) }

    fn index_content(&self) -> String { TextExtractor::extract(self, &self.searchable_columns().content) }

    /// The derived index row currently stored for this record, if any.
    fn indexed_record(&self, store: &dyn IndexStore) -> Result<Option<IndexRecord>> { store.find(&self.record_key()) }
}

/// A record that is not searchable itself but feeds a searchable parent.
pub trait SearchableRelation: Entity {
    /// Name of the relation leading to the searchable parent; `None` when unset.
    fn searchable_relation_name(&self) -> Option<&str>;
}

/// Persistence of derived index rows, unique per `RecordKey`.
pub trait IndexStore: Send + Sync {
    fn find(&self, key: &RecordKey) -> Result<Option<IndexRecord>>;
    /// Insert or replace the row for `record.key`; assigns the surrogate id on first save.
    fn save(&self, record: IndexRecord) -> Result<IndexRecord>;
    /// Returns whether a row existed.
    fn delete(&self, key: &RecordKey) -> Result<bool>;
    fn count(&self) -> Result<usize>;
}

impl<T: IndexStore + ?Sized> IndexStore for &T {
    fn find(&self, key: &RecordKey) -> Result<Option<IndexRecord>> { (**self).find(key) }
    fn save(&self, record: IndexRecord) -> Result<IndexRecord> { (**self).save(record) }
    fn delete(&self, key: &RecordKey) -> Result<bool> { (**self).delete(key) }
    fn count(&self) -> Result<usize> { (**self).count() }
}

impl<T: IndexStore + ?Sized> IndexStore for Arc<T> {
    fn find(&self, key: &RecordKey) -> Result<Option<IndexRecord>> { (**self).find(key) }
    fn save(&self, record: IndexRecord) -> Result<IndexRecord> { (**self).save(record) }
    fn delete(&self, key: &RecordKey) -> Result<bool> { (**self).delete(key) }
    fn count(&self) -> Result<usize> { (**self).count() }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchRequest<'a> {
    pub record_type: &'a str,
    pub keywords: &'a str,
    pub mode: Option<SearchMode>,
}

/// Native full-text matching over the index rows.
pub trait FullTextEngine: Send + Sync {
    /// Scores for every indexed record of `record_type` whose title+content
    /// matches `keywords` under `mode` (engine default when `None`).
    fn match_scores(&self, request: &MatchRequest<'_>) -> Result<Vec<MatchScore>>;
}

/// Enumerates the records of one type for batch (re)indexing.
pub trait RecordSource {
    type Record: Searchable;

    fn record_type(&self) -> &str;
    fn count(&self, id: Option<RecordId>) -> Result<usize>;
    fn chunk(&self, id: Option<RecordId>, offset: usize, limit: usize) -> Result<Vec<Self::Record>>;
}
