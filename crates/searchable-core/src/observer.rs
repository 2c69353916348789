//! Lifecycle-driven synchronization of index rows.
//!
//! Created, Updated and Restored events re-extract title/content and upsert
//! the record's index row; Deleted removes it. Events for a record type whose
//! syncing is disabled in the [`SyncSuppression`] set are ignored, which lets
//! bulk loads skip per-record indexing and reindex wholesale afterwards.

use chrono::Utc;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::{IndexStore, Searchable, SearchableRelation};
use crate::types::{IndexRecord, Related};

static GLOBAL_SUPPRESSION: Lazy<Arc<SyncSuppression>> = Lazy::new(|| Arc::new(SyncSuppression::new()));

/// Record types whose automatic syncing is disabled.
///
/// Toggled only by explicit `disable_for` / `enable_for` calls. The set is
/// lock-protected, but callers must not run concurrent bulk loads of one
/// type while toggling it.
#[derive(Debug, Default)]
pub struct SyncSuppression {
    disabled: RwLock<HashSet<String>>,
}

impl SyncSuppression {
    pub fn new() -> Self { Self::default() }

    /// The process-wide set used by observers built with [`SyncObserver::new`].
    pub fn global() -> Arc<SyncSuppression> { Arc::clone(&GLOBAL_SUPPRESSION) }

    pub fn disable_for(&self, record_type: &str) {
        debug!(record_type, "syncing disabled");
        self.disabled.write().insert(record_type.to_string());
    }

    pub fn enable_for(&self, record_type: &str) {
        debug!(record_type, "syncing enabled");
        self.disabled.write().remove(record_type);
    }

    pub fn is_disabled_for(&self, record_type: &str) -> bool { self.disabled.read().contains(record_type) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Created,
    Updated,
    Deleted,
    Restored,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleEvent::Created => "created",
            LifecycleEvent::Updated => "updated",
            LifecycleEvent::Deleted => "deleted",
            LifecycleEvent::Restored => "restored",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Indexed(IndexRecord),
    Removed,
    /// Deleted event for a record that had no index row.
    NotIndexed,
    Suppressed,
}

pub struct SyncObserver<S: IndexStore> {
    store: S,
    suppression: Arc<SyncSuppression>,
}

impl<S: IndexStore> SyncObserver<S> {
    /// Observer gated by the process-wide suppression set.
    pub fn new(store: S) -> Self { Self::with_suppression(store, SyncSuppression::global()) }

    pub fn with_suppression(store: S, suppression: Arc<SyncSuppression>) -> Self { Self { store, suppression } }

    pub fn store(&self) -> &S { &self.store }

    pub fn suppression(&self) -> &SyncSuppression { &self.suppression }

    pub fn handle<R: Searchable + ?Sized>(&self, event: LifecycleEvent, record: &R) -> Result<SyncOutcome> {
        if self.suppression.is_disabled_for(record.record_type()) {
            debug!(key = %record.record_key(), %event, "sync suppressed");
            return Ok(SyncOutcome::Suppressed);
        }
        match event {
            LifecycleEvent::Created | LifecycleEvent::Updated | LifecycleEvent::Restored => {
                self.index_record(record).map(SyncOutcome::Indexed)
            }
            LifecycleEvent::Deleted => {
                Ok(if self.unindex_record(record)? { SyncOutcome::Removed } else { SyncOutcome::NotIndexed })
            }
        }
    }

    pub fn created<R: Searchable + ?Sized>(&self, record: &R) -> Result<SyncOutcome> { self.handle(LifecycleEvent::Created, record) }

    pub fn updated<R: Searchable + ?Sized>(&self, record: &R) -> Result<SyncOutcome> { self.handle(LifecycleEvent::Updated, record) }

    pub fn deleted<R: Searchable + ?Sized>(&self, record: &R) -> Result<SyncOutcome> { self.handle(LifecycleEvent::Deleted, record) }

    pub fn restored<R: Searchable + ?Sized>(&self, record: &R) -> Result<SyncOutcome> { self.handle(LifecycleEvent::Restored, record) }

    /// Upsert the record's index row, ignoring suppression.
    pub fn index_record<R: Searchable + ?Sized>(&self, record: &R) -> Result<IndexRecord> {
        let key = record.record_key();
        let now = Utc::now();
        let mut row = self.store.find(&key)?.unwrap_or_else(|| IndexRecord::new(key, now));
        row.title = record.index_title();
        row.content = record.index_content();
        row.updated_at = now;
        let saved = self.store.save(row)?;
        debug!(key = %saved.key, id = ?saved.id, "indexed record");
        Ok(saved)
    }

    /// Delete the record's index row, ignoring suppression. Returns whether one existed.
    pub fn unindex_record<R: Searchable + ?Sized>(&self, record: &R) -> Result<bool> {
        let key = record.record_key();
        let removed = self.store.delete(&key)?;
        debug!(%key, removed, "unindexed record");
        Ok(removed)
    }
}

/// Forwards mutations of a non-searchable relation record to its searchable
/// parent as an `Updated` event, so the parent's extracted text is refreshed.
pub struct RelationObserver<'o, S: IndexStore> {
    observer: &'o SyncObserver<S>,
}

impl<'o, S: IndexStore> RelationObserver<'o, S> {
    pub fn new(observer: &'o SyncObserver<S>) -> Self { Self { observer } }

    /// An unset relation name, a missing parent or a non-searchable parent is
    /// a configuration defect and is returned as [`Error::RelationNotFound`].
    pub fn handle<C: SearchableRelation + ?Sized>(&self, event: LifecycleEvent, child: &C) -> Result<SyncOutcome> {
        let name = child
            .searchable_relation_name()
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::RelationNotFound("searchable relation name is not set".to_string()))?;
        let parent = match child.related(name) {
            Related::One(parent) => parent.as_searchable(),
            Related::Absent | Related::Many(_) => None,
        }
        .ok_or_else(|| Error::RelationNotFound(name.to_string()))?;
        debug!(relation = name, %event, parent = %parent.record_key(), "forwarding relation event to parent");
        self.observer.handle(LifecycleEvent::Updated, parent)
    }
}
