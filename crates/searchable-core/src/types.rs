//! Domain types shared by the sync, query and storage layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::traits::Entity;

pub type RecordId = u64;

/// Polymorphic reference from an index row back to its source record.
///
/// Unique per index: a source record owns at most one `IndexRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub record_type: String,
    pub record_id: RecordId,
}

impl RecordKey {
    pub fn new(record_type: impl Into<String>, record_id: RecordId) -> Self {
        Self { record_type: record_type.into(), record_id }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.record_type, self.record_id)
    }
}

/// Derived title/content snapshot of one source record.
///
/// - `id`: surrogate id, `None` until the store persists the row
/// - `key`: the owning source record
/// - `title`/`content`: extractor output at last sync, never edited directly
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: Option<u64>,
    pub key: RecordKey,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IndexRecord {
    pub fn new(key: RecordKey, now: DateTime<Utc>) -> Self {
        Self { id: None, key, title: String::new(), content: String::new(), created_at: now, updated_at: now }
    }
}

/// A scalar (or list of scalars) read from an entity field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<FieldValue>),
}

impl FieldValue {
    /// String form used for indexing. Lists are joined with a single space
    /// and the result is trimmed.
    pub fn to_index_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.trim().to_string(),
            FieldValue::Int(i) => i.to_string(),
            FieldValue::Float(f) => f.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::List(items) => items
                .iter()
                .map(FieldValue::to_index_string)
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self { FieldValue::Text(value.to_string()) }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self { FieldValue::Text(value) }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self { FieldValue::Int(value) }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self { value.map_or(FieldValue::Null, Into::into) }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(value: Vec<T>) -> Self { FieldValue::List(value.into_iter().map(Into::into).collect()) }
}

/// Result of following one relation hop.
pub enum Related<'a> {
    /// Relation unknown, or a to-one relation holding null.
    Absent,
    One(&'a dyn Entity),
    Many(Vec<&'a dyn Entity>),
}

/// Per-record match scores reported by a full-text engine.
///
/// Only records whose combined title+content matched are reported;
/// `title_score` is 0 when the title alone did not match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScore {
    pub record_id: RecordId,
    pub title_score: f32,
    pub title_content_score: f32,
}
