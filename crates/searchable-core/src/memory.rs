//! In-process `IndexStore` for tests and dry runs. No full-text matching.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::traits::IndexStore;
use crate::types::{IndexRecord, RecordKey};

#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    rows: BTreeMap<RecordKey, IndexRecord>,
    last_id: u64,
}

impl MemoryIndexStore {
    pub fn new() -> Self { Self::default() }

    /// Rows ordered by key.
    pub fn records(&self) -> Vec<IndexRecord> { self.inner.read().rows.values().cloned().collect() }
}

impl IndexStore for MemoryIndexStore {
    fn find(&self, key: &RecordKey) -> Result<Option<IndexRecord>> { Ok(self.inner.read().rows.get(key).cloned()) }

    fn save(&self, mut record: IndexRecord) -> Result<IndexRecord> {
        let mut inner = self.inner.write();
        if record.id.is_none() {
            inner.last_id += 1;
            record.id = Some(inner.last_id);
        }
        inner.rows.insert(record.key.clone(), record.clone());
        Ok(record)
    }

    fn delete(&self, key: &RecordKey) -> Result<bool> { Ok(self.inner.write().rows.remove(key).is_some()) }

    fn count(&self) -> Result<usize> { Ok(self.inner.read().rows.len()) }
}
