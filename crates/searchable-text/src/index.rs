use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::TermQuery;
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Searcher, TantivyDocument, Term};
use tracing::{debug, info};

use searchable_core::traits::IndexStore;
use searchable_core::types::{IndexRecord, RecordKey};

use crate::search::TantivySearchEngine;
use crate::tantivy_utils::{build_schema, register_tokenizer, IndexFields, INDEX_ID};

const WRITER_MEMORY: usize = 50_000_000;

/// Index rows kept in a tantivy index, one document per `RecordKey`.
///
/// Every save or delete is committed and the shared reader reloaded before
/// returning, so engines obtained from [`TantivyIndexStore::search_engine`]
/// see the change immediately.
pub struct TantivyIndexStore {
	index: Index,
	reader: IndexReader,
	writer: Mutex<IndexWriter>,
	fields: IndexFields,
	last_id: AtomicU64,
}

impl TantivyIndexStore {
	/// Open (or create) the index under `dir`; `None` keeps it in memory.
	pub fn open(dir: Option<&Path>) -> searchable_core::Result<Self> { Ok(Self::open_inner(dir)?) }

	pub fn in_memory() -> searchable_core::Result<Self> { Self::open(None) }

	fn open_inner(dir: Option<&Path>) -> Result<Self> {
		let schema = build_schema();
		let index = match dir {
			Some(dir) => {
				std::fs::create_dir_all(dir)?;
				info!(path = %dir.display(), "opening search index");
				Index::open_or_create(MmapDirectory::open(dir)?, schema.clone())?
			}
			None => Index::create_in_ram(schema.clone()),
		};
		register_tokenizer(&index);
		let fields = IndexFields::from_schema(&index.schema())?;
		let reader: IndexReader = index.reader_builder().reload_policy(ReloadPolicy::Manual).try_into()?;
		let writer = index.writer_with_num_threads(1, WRITER_MEMORY)?;
		let last_id = max_index_id(&reader.searcher())?.max(committed_high_water(&index)?);
		debug!(last_id, "search index ready");
		Ok(Self { index, reader, writer: Mutex::new(writer), fields, last_id: AtomicU64::new(last_id) })
	}

	/// Engine matching against this store's committed rows.
	pub fn search_engine(&self) -> TantivySearchEngine {
		TantivySearchEngine::from_parts(self.index.clone(), self.reader.clone(), self.fields)
	}

	fn key_term(&self, key: &RecordKey) -> Term { Term::from_field_text(self.fields.key, &key.to_string()) }

	fn find_inner(&self, key: &RecordKey) -> Result<Option<IndexRecord>> {
		let searcher = self.reader.searcher();
		let query = TermQuery::new(self.key_term(key), IndexRecordOption::Basic);
		let Some((_, address)) = searcher.search(&query, &TopDocs::with_limit(1))?.into_iter().next() else {
			return Ok(None);
		};
		let doc: TantivyDocument = searcher.doc(address)?;
		self.to_record(&doc).map(Some)
	}

	fn save_inner(&self, mut record: IndexRecord) -> Result<IndexRecord> {
		let id = match record.id {
			Some(id) => id,
			None => self.last_id.fetch_add(1, Ordering::SeqCst) + 1,
		};
		record.id = Some(id);
		let f = self.fields;
		let document = doc!(
			f.key => record.key.to_string(),
			f.record_type => record.key.record_type.clone(),
			f.record_id => record.key.record_id,
			f.index_id => id,
			f.title => record.title.clone(),
			f.content => record.content.clone(),
			f.title_content => format!("{} {}", record.title, record.content),
			f.created_at => record.created_at.timestamp_micros(),
			f.updated_at => record.updated_at.timestamp_micros(),
		);
		let mut writer = self.writer.lock();
		writer.delete_term(self.key_term(&record.key));
		writer.add_document(document)?;
		self.commit(&mut writer)?;
		Ok(record)
	}

	fn delete_inner(&self, key: &RecordKey) -> Result<bool> {
		if self.find_inner(key)?.is_none() {
			return Ok(false);
		}
		let mut writer = self.writer.lock();
		writer.delete_term(self.key_term(key));
		self.commit(&mut writer)?;
		Ok(true)
	}

	/// Commits pending changes with the surrogate id high-water mark as payload.
	fn commit(&self, writer: &mut IndexWriter) -> Result<()> {
		let mut prepared = writer.prepare_commit()?;
		prepared.set_payload(&self.last_id.load(Ordering::SeqCst).to_string());
		prepared.commit()?;
		self.reader.reload()?;
		Ok(())
	}

	fn to_record(&self, doc: &TantivyDocument) -> Result<IndexRecord> {
		let f = self.fields;
		let text = |field| doc.get_first(field).and_then(|v| v.as_str()).unwrap_or_default().to_string();
		let number = |field| doc.get_first(field).and_then(|v| v.as_u64()).ok_or_else(|| anyhow!("index row without numeric id"));
		let time = |field| {
			doc.get_first(field)
				.and_then(|v| v.as_i64())
				.and_then(DateTime::<Utc>::from_timestamp_micros)
				.ok_or_else(|| anyhow!("index row with invalid timestamp"))
		};
		Ok(IndexRecord {
			id: Some(number(f.index_id)?),
			key: RecordKey::new(text(f.record_type), number(f.record_id)?),
			title: text(f.title),
			content: text(f.content),
			created_at: time(f.created_at)?,
			updated_at: time(f.updated_at)?,
		})
	}
}

// Survives deletion of every row, which empties the segments scanned below.
fn committed_high_water(index: &Index) -> Result<u64> {
	let payload = index.load_metas()?.payload;
	Ok(payload.and_then(|p| p.parse().ok()).unwrap_or(0))
}

fn max_index_id(searcher: &Searcher) -> Result<u64> {
	let mut max = 0;
	for segment in searcher.segment_readers() {
		if segment.num_docs() == 0 {
			continue;
		}
		max = max.max(segment.fast_fields().u64(INDEX_ID)?.max_value());
	}
	Ok(max)
}

impl IndexStore for TantivyIndexStore {
	fn find(&self, key: &RecordKey) -> searchable_core::Result<Option<IndexRecord>> { Ok(self.find_inner(key)?) }

	fn save(&self, record: IndexRecord) -> searchable_core::Result<IndexRecord> { Ok(self.save_inner(record)?) }

	fn delete(&self, key: &RecordKey) -> searchable_core::Result<bool> { Ok(self.delete_inner(key)?) }

	fn count(&self) -> searchable_core::Result<usize> {
		let num_docs = self.reader.searcher().num_docs();
		Ok(usize::try_from(num_docs).map_err(anyhow::Error::from)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn row(record_type: &str, id: u64, title: &str) -> IndexRecord {
		let mut record = IndexRecord::new(RecordKey::new(record_type, id), Utc::now());
		record.title = title.to_string();
		record.content = "body text".to_string();
		record
	}

	#[test]
	fn save_replaces_row_for_same_key() {
		let store = TantivyIndexStore::in_memory().expect("store");
		let first = store.save(row("post", 1, "First")).expect("save");
		let mut edited = first.clone();
		edited.title = "Edited".to_string();
		let second = store.save(edited).expect("save");

		assert_eq!(first.id, Some(1));
		assert_eq!(second.id, first.id);
		assert_eq!(store.count().expect("count"), 1);
		let found = store.find(&RecordKey::new("post", 1)).expect("find").expect("row");
		assert_eq!(found.title, "Edited");
		assert_eq!(found.created_at.timestamp_micros(), first.created_at.timestamp_micros());
	}

	#[test]
	fn same_id_under_different_types_are_distinct_rows() {
		let store = TantivyIndexStore::in_memory().expect("store");
		store.save(row("post", 1, "Post")).expect("save");
		store.save(row("page", 1, "Page")).expect("save");
		assert_eq!(store.count().expect("count"), 2);
		assert!(store.delete(&RecordKey::new("page", 1)).expect("delete"));
		assert!(!store.delete(&RecordKey::new("page", 1)).expect("delete"));
		assert!(store.find(&RecordKey::new("post", 1)).expect("find").is_some());
	}

	#[test]
	fn surrogate_ids_are_not_reused_after_reopening_an_emptied_index() {
		let dir = tempfile::tempdir().expect("tempdir");
		{
			let store = TantivyIndexStore::open(Some(dir.path())).expect("store");
			let first = store.save(row("post", 1, "First")).expect("save");
			assert_eq!(first.id, Some(1));
			assert!(store.delete(&RecordKey::new("post", 1)).expect("delete"));
			assert_eq!(store.count().expect("count"), 0);
		}
		let store = TantivyIndexStore::open(Some(dir.path())).expect("reopen");
		let second = store.save(row("post", 2, "Second")).expect("save");
		assert_eq!(second.id, Some(2));
	}
}
