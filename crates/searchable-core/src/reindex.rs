//! Batch (re)indexing of every record of one type.
//!
//! Records are pulled from a [`RecordSource`] in fixed-size chunks so large
//! record sets are never held in memory at once. Direct index operations are
//! used, so a type whose syncing is suppressed for a bulk load can be
//! reindexed here afterwards.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::error::{Error, Result};
use crate::observer::SyncObserver;
use crate::traits::{IndexStore, RecordSource};
use crate::types::RecordId;

pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Index,
    Unindex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
}

pub struct Reindexer<'o, S: IndexStore> {
    observer: &'o SyncObserver<S>,
    batch_size: usize,
    show_progress: bool,
}

impl<'o, S: IndexStore> Reindexer<'o, S> {
    pub fn new(observer: &'o SyncObserver<S>) -> Self {
        Self { observer, batch_size: DEFAULT_BATCH_SIZE, show_progress: false }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn index_all<R: RecordSource>(&self, source: &R, id: Option<RecordId>) -> Result<BatchReport> {
        self.run(BatchAction::Index, source, id)
    }

    pub fn unindex_all<R: RecordSource>(&self, source: &R, id: Option<RecordId>) -> Result<BatchReport> {
        self.run(BatchAction::Unindex, source, id)
    }

    /// Fails with [`Error::NotFound`] before touching the index when no record matches.
    pub fn run<R: RecordSource>(&self, action: BatchAction, source: &R, id: Option<RecordId>) -> Result<BatchReport> {
        let total = source.count(id)?;
        if total == 0 {
            return Err(Error::NotFound(not_found_message(source.record_type(), id)));
        }
        let pb = self.progress_bar(total)?;
        let mut processed = 0usize;
        let mut offset = 0usize;
        loop {
            let chunk = source.chunk(id, offset, self.batch_size)?;
            if chunk.is_empty() {
                break;
            }
            offset += chunk.len();
            for record in &chunk {
                match action {
                    BatchAction::Index => {
                        self.observer.index_record(record)?;
                    }
                    BatchAction::Unindex => {
                        self.observer.unindex_record(record)?;
                    }
                }
                processed += 1;
                pb.inc(1);
            }
            info!(record_type = source.record_type(), ?action, processed, total, "batch done");
            if chunk.len() < self.batch_size {
                break;
            }
        }
        pb.finish_with_message("done");
        Ok(BatchReport { processed })
    }

    fn progress_bar(&self, total: usize) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} records ({percent}%) {msg}")
            .map_err(|e| Error::Store(e.into()))?
            .progress_chars("#>-");
        pb.set_style(style);
        Ok(pb)
    }
}

fn not_found_message(record_type: &str, id: Option<RecordId>) -> String {
    match id {
        Some(id) => format!("Records of {record_type} and id {id} not found!"),
        None => format!("Records of {record_type} not found!"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_filters() {
        assert_eq!(not_found_message("post", None), "Records of post not found!");
        assert_eq!(not_found_message("post", Some(4)), "Records of post and id 4 not found!");
    }
}
