//! Weighted multi-field relevance search over the index.
//!
//! A [`SearchQuery`] joins a source record set to the index on
//! `(record_type, record_id)`, keeps rows whose title+content match the
//! cleaned keywords, collapses duplicate joins to one row per source record
//! and orders by
//!
//! ```text
//! title_weight * match(title) + content_weight * match(title, content)
//! ```
//!
//! The same plan renders to SQL for a relational store with native
//! `MATCH ... AGAINST` support, or executes against a [`FullTextEngine`].
//! Empty keywords match nothing. Equal scores are ordered by source id,
//! ascending.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::cleaner::CleanerRegistry;
use crate::config::SearchableConfig;
use crate::error::{Error, Result};
use crate::mode::SearchMode;
use crate::traits::{FullTextEngine, MatchRequest, Searchable};
use crate::types::RecordId;
use crate::weights::SearchWeights;

/// Column alias of the computed relevance score.
pub const SCORE_ALIAS: &str = "searchable_score";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(Error::InvalidConfig(format!("unknown sort direction '{other}'"))),
        }
    }
}

/// The source relation a search is joined back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTable {
    pub record_type: String,
    pub table: String,
    pub primary_key: String,
}

impl SourceTable {
    pub fn new(record_type: impl Into<String>, table: impl Into<String>) -> Self {
        Self { record_type: record_type.into(), table: table.into(), primary_key: "id".to_string() }
    }

    #[must_use]
    pub fn with_primary_key(mut self, primary_key: impl Into<String>) -> Self {
        self.primary_key = primary_key.into();
        self
    }
}

/// SQL text with positional `?` bindings, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub sql: String,
    pub bindings: Vec<String>,
}

/// A source record with its computed relevance.
pub struct Ranked<'r, T: ?Sized> {
    pub record: &'r T,
    pub score: f64,
}

impl<T: Searchable + ?Sized> fmt::Debug for Ranked<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ranked").field("key", &self.record.record_key()).field("score", &self.score).finish()
    }
}

/// Builds search queries with weights and cleaners resolved once up front.
#[derive(Debug, Clone)]
pub struct SearchQueryBuilder {
    index_table: String,
    weights: SearchWeights,
    cleaners: CleanerRegistry,
}

impl SearchQueryBuilder {
    pub fn new(index_table: impl Into<String>, weights: SearchWeights, cleaners: CleanerRegistry) -> Self {
        Self { index_table: index_table.into(), weights, cleaners }
    }

    pub fn from_config(config: &SearchableConfig) -> Result<Self> {
        Ok(Self::new(config.table_name.clone(), config.weight, config.cleaner_registry()?))
    }

    pub fn weights(&self) -> SearchWeights { self.weights }

    pub fn search(&self, source: SourceTable, keywords: &str, mode: Option<SearchMode>) -> SearchQuery {
        let cleaned = self.cleaners.clean(keywords, mode);
        debug!(record_type = source.record_type.as_str(), keywords, cleaned = cleaned.as_str(), ?mode, "built search query");
        SearchQuery {
            source,
            index_table: self.index_table.clone(),
            keywords: cleaned,
            mode,
            weights: self.weights,
            direction: SortDirection::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub source: SourceTable,
    pub index_table: String,
    /// Keywords after the cleaner pipeline.
    pub keywords: String,
    pub mode: Option<SearchMode>,
    pub weights: SearchWeights,
    pub direction: SortDirection,
}

impl SearchQuery {
    #[must_use]
    pub fn order(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn matches_nothing(&self) -> bool { self.keywords.trim().is_empty() }

    fn against(&self) -> String {
        match self.mode {
            Some(mode) => format!("AGAINST (? {})", mode.modifier()),
            None => "AGAINST (?)".to_string(),
        }
    }

    /// MySQL statement selecting the source rows plus `searchable_score`.
    pub fn to_sql(&self) -> SqlStatement {
        let index = quote_ident(&self.index_table);
        let source = quote_ident(&self.source.table);
        let primary_key = format!("{source}.{}", quote_ident(&self.source.primary_key));
        let title = format!("{index}.`title`");
        let title_content = format!("{title}, {index}.`content`");
        let against = self.against();

        let score = format!(
            "({title_weight} * (MATCH ({title}) {against}) + {content_weight} * (MATCH ({title_content}) {against}))",
            title_weight = self.weights.title,
            content_weight = self.weights.content,
        );
        let sql = format!(
            "SELECT {source}.*, {score} AS `{SCORE_ALIAS}` FROM {source} \
             LEFT JOIN {index} ON {index}.`searchable_id` = {primary_key} AND {index}.`searchable_type` = ? \
             WHERE MATCH ({title_content}) {against} \
             GROUP BY {primary_key} \
             ORDER BY `{SCORE_ALIAS}` {direction}, {primary_key} ASC",
            direction = self.direction.as_sql(),
        );
        let bindings = vec![
            self.keywords.clone(),
            self.keywords.clone(),
            self.source.record_type.clone(),
            self.keywords.clone(),
        ];
        SqlStatement { sql, bindings }
    }

    /// Rank `records` against `engine`. Records of other types, records
    /// without a matching index row and repeated ids are dropped.
    pub fn execute<'r, T, I, E>(&self, engine: &E, records: I) -> Result<Vec<Ranked<'r, T>>>
    where
        T: Searchable + ?Sized + 'r,
        I: IntoIterator<Item = &'r T>,
        E: FullTextEngine + ?Sized,
    {
        if self.matches_nothing() {
            debug!(record_type = self.source.record_type.as_str(), "empty keywords match nothing");
            return Ok(Vec::new());
        }
        let request = MatchRequest { record_type: &self.source.record_type, keywords: &self.keywords, mode: self.mode };
        let mut scores: HashMap<RecordId, f64> = HashMap::new();
        for m in engine.match_scores(&request)? {
            let score = self.weights.score(f64::from(m.title_score), f64::from(m.title_content_score));
            scores.entry(m.record_id).and_modify(|s| *s = s.max(score)).or_insert(score);
        }

        let mut seen = HashSet::new();
        let mut ranked: Vec<Ranked<'r, T>> = records
            .into_iter()
            .filter(|record| record.record_type() == self.source.record_type)
            .filter(|record| seen.insert(record.record_id()))
            .filter_map(|record| scores.get(&record.record_id()).map(|&score| Ranked { record, score }))
            .collect();
        ranked.sort_by(|a, b| self.compare(a, b));
        debug!(record_type = self.source.record_type.as_str(), hits = ranked.len(), "search executed");
        Ok(ranked)
    }

    fn compare<T: Searchable + ?Sized>(&self, a: &Ranked<'_, T>, b: &Ranked<'_, T>) -> Ordering {
        let by_score = match self.direction {
            SortDirection::Asc => a.score.total_cmp(&b.score),
            SortDirection::Desc => b.score.total_cmp(&a.score),
        };
        by_score.then_with(|| a.record.record_id().cmp(&b.record.record_id()))
    }
}

fn quote_ident(ident: &str) -> String { format!("`{}`", ident.replace('`', "``")) }
