//! searchable-text
//!
//! Tantivy-backed index rows and full-text matching for `searchable-core`.
//! `index` persists rows; `search` scores them for relevance queries.
pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyIndexStore;
pub use search::TantivySearchEngine;
