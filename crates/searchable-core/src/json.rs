//! JSON-backed records.
//!
//! Any `serde_json::Value` is an [`Entity`]: objects are to-one relations,
//! arrays are to-many relations, null is an absent relation, and scalars or
//! arrays of scalars are fields. [`JsonRecordSet`] loads fixture documents of
//! the form
//!
//! ```json
//! {
//!   "types":   { "post": { "title": ["title"], "content": ["body", "author.name"] } },
//!   "records": { "post": [ { "id": 1, "title": "Hello", "author": { "name": "Ann" } } ] }
//! }
//! ```

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::column::SearchableColumns;
use crate::error::{Error, Result};
use crate::traits::{Entity, RecordSource, Searchable};
use crate::types::{FieldValue, RecordId, Related};

impl Entity for Value {
    fn field(&self, name: &str) -> Option<FieldValue> { self.get(name).map(field_value) }

    fn related(&self, name: &str) -> Related<'_> {
        match self.get(name) {
            Some(object @ Value::Object(_)) => Related::One(object),
            Some(Value::Array(items)) => Related::Many(items.iter().map(|item| item as &dyn Entity).collect()),
            _ => Related::Absent,
        }
    }
}

fn field_value(value: &Value) -> FieldValue {
    match value {
        Value::Null | Value::Object(_) => FieldValue::Null,
        Value::Bool(b) => FieldValue::Bool(*b),
        Value::Number(n) => n.as_i64().map_or_else(|| FieldValue::Text(n.to_string()), FieldValue::Int),
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Array(items) => FieldValue::List(items.iter().map(field_value).collect()),
    }
}

#[derive(Debug, Clone)]
pub struct JsonRecord {
    record_type: String,
    id: RecordId,
    columns: Arc<SearchableColumns>,
    value: Value,
}

impl JsonRecord {
    pub fn new(record_type: impl Into<String>, id: RecordId, columns: Arc<SearchableColumns>, value: Value) -> Self {
        Self { record_type: record_type.into(), id, columns, value }
    }

    pub fn value(&self) -> &Value { &self.value }

    pub fn value_mut(&mut self) -> &mut Value { &mut self.value }
}

impl Entity for JsonRecord {
    fn field(&self, name: &str) -> Option<FieldValue> { self.value.field(name) }

    fn related(&self, name: &str) -> Related<'_> { self.value.related(name) }

    fn as_searchable(&self) -> Option<&dyn Searchable> { Some(self) }
}

impl Searchable for JsonRecord {
    fn record_type(&self) -> &str { &self.record_type }

    fn record_id(&self) -> RecordId { self.id }

    fn searchable_columns(&self) -> &SearchableColumns { &self.columns }
}

#[derive(Debug, Deserialize)]
struct FixtureDocument {
    #[serde(default)]
    types: BTreeMap<String, FixtureColumns>,
    #[serde(default)]
    records: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct FixtureColumns {
    #[serde(default)]
    title: Vec<String>,
    #[serde(default)]
    content: Vec<String>,
}

/// Enrolled record types and their records, loaded from JSON fixtures.
#[derive(Debug, Clone, Default)]
pub struct JsonRecordSet {
    types: BTreeMap<String, Arc<SearchableColumns>>,
    records: BTreeMap<String, Vec<JsonRecord>>,
}

impl JsonRecordSet {
    pub fn new() -> Self { Self::default() }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let mut set = Self::new();
        set.merge_str(json, "<inline>")?;
        Ok(set)
    }

    /// Load one fixture file, or every `*.json` file under a directory in
    /// path order.
    pub fn load(path: &Path) -> Result<Self> {
        let mut set = Self::new();
        for file in list_json_files(path) {
            debug!(path = %file.display(), "loading record fixtures");
            let text = fs::read_to_string(&file)?;
            set.merge_str(&text, &file.display().to_string())?;
        }
        Ok(set)
    }

    fn merge_str(&mut self, json: &str, origin: &str) -> Result<()> {
        let document: FixtureDocument =
            serde_json::from_str(json).map_err(|e| Error::InvalidConfig(format!("{origin}: {e}")))?;
        for (record_type, columns) in document.types {
            self.types.insert(record_type, Arc::new(SearchableColumns::new(&columns.title, &columns.content)));
        }
        for (record_type, values) in document.records {
            let columns = self.columns(&record_type)?;
            for value in values {
                let id = value
                    .get("id")
                    .and_then(Value::as_u64)
                    .ok_or_else(|| Error::InvalidConfig(format!("{origin}: {record_type} record without a numeric id")))?;
                self.push(JsonRecord::new(record_type.clone(), id, Arc::clone(&columns), value));
            }
        }
        Ok(())
    }

    pub fn enroll(&mut self, record_type: impl Into<String>, columns: SearchableColumns) -> Arc<SearchableColumns> {
        let columns = Arc::new(columns);
        self.types.insert(record_type.into(), Arc::clone(&columns));
        columns
    }

    pub fn push(&mut self, record: JsonRecord) {
        self.records.entry(record.record_type.clone()).or_default().push(record);
    }

    pub fn columns(&self, record_type: &str) -> Result<Arc<SearchableColumns>> {
        self.types
            .get(record_type)
            .cloned()
            .ok_or_else(|| Error::InvalidConfig(format!("record type '{record_type}' is not searchable")))
    }

    pub fn is_enrolled(&self, record_type: &str) -> bool { self.types.contains_key(record_type) }

    pub fn record_types(&self) -> impl Iterator<Item = &str> { self.types.keys().map(String::as_str) }

    pub fn records(&self, record_type: &str) -> &[JsonRecord] {
        self.records.get(record_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, record_type: &str, id: RecordId) -> Option<&JsonRecord> {
        self.records(record_type).iter().find(|record| record.id == id)
    }

    /// Batch source over one enrolled type.
    pub fn source(&self, record_type: &str) -> Result<JsonSource<'_>> {
        let (record_type, _) = self
            .types
            .get_key_value(record_type)
            .ok_or_else(|| Error::InvalidConfig(format!("record type '{record_type}' is not searchable")))?;
        Ok(JsonSource { record_type, records: self.records(record_type) })
    }
}

pub struct JsonSource<'a> {
    record_type: &'a str,
    records: &'a [JsonRecord],
}

impl<'a> JsonSource<'a> {
    fn matching(&self, id: Option<RecordId>) -> impl Iterator<Item = &'a JsonRecord> + 'a {
        let records = self.records;
        records.iter().filter(move |record| id.map_or(true, |id| record.id == id))
    }
}

impl RecordSource for JsonSource<'_> {
    type Record = JsonRecord;

    fn record_type(&self) -> &str { self.record_type }

    fn count(&self, id: Option<RecordId>) -> Result<usize> { Ok(self.matching(id).count()) }

    fn chunk(&self, id: Option<RecordId>, offset: usize, limit: usize) -> Result<Vec<JsonRecord>> {
        Ok(self.matching(id).skip(offset).take(limit).cloned().collect())
    }
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    files.sort();
    files
}
