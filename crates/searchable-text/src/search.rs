use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, ConstScoreQuery, Occur, Query, QueryParser, RegexQuery, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{DocAddress, Index, IndexReader, Searcher, TantivyDocument, Term};
use tracing::{debug, warn};

use searchable_core::mode::SearchMode;
use searchable_core::traits::{FullTextEngine, MatchRequest};
use searchable_core::types::MatchScore;

use crate::tantivy_utils::{analyze, register_tokenizer, IndexFields};

/// Documents read back for blind query expansion.
const EXPANSION_DOCS: usize = 3;
/// Terms added from those documents at most.
const EXPANSION_TERMS: usize = 20;

/// Scores index rows against keywords the way the relevance query expects:
/// one score over `title` alone and one over `title` plus `content`.
///
/// Natural language mode ORs the analyzed keywords. Boolean mode reads the
/// keywords with tantivy's query grammar (`+must -not "phrase"`), tolerating
/// syntax errors, and maps a trailing `*` to a prefix match. Expansion modes
/// search once, harvest terms from the best rows and search again with the
/// widened term set.
#[derive(Clone)]
pub struct TantivySearchEngine {
	index: Index,
	reader: IndexReader,
	fields: IndexFields,
}

impl TantivySearchEngine {
	/// Read-only engine over an index directory written by `TantivyIndexStore`.
	pub fn open_in_dir(index_dir: &Path) -> searchable_core::Result<Self> {
		let index = Index::open_in_dir(index_dir).map_err(anyhow::Error::from)?;
		register_tokenizer(&index);
		let reader = index.reader().map_err(anyhow::Error::from)?;
		let fields = IndexFields::from_schema(&index.schema())?;
		Ok(Self { index, reader, fields })
	}

	pub(crate) fn from_parts(index: Index, reader: IndexReader, fields: IndexFields) -> Self { Self { index, reader, fields } }

	fn scores(&self, request: &MatchRequest<'_>) -> Result<Vec<MatchScore>> {
		let searcher = self.reader.searcher();
		let limit = usize::try_from(searcher.num_docs())?;
		if limit == 0 || request.keywords.trim().is_empty() {
			return Ok(Vec::new());
		}
		let f = self.fields;
		let mode = request.mode.unwrap_or(SearchMode::NaturalLanguage);
		let (title_query, combined_query) = if mode == SearchMode::Boolean {
			let keywords = BooleanKeywords::parse(request.keywords);
			match (self.boolean_query(f.title, &keywords)?, self.boolean_query(f.title_content, &keywords)?) {
				(Some(title), Some(combined)) => (title, combined),
				_ => {
					debug!(keywords = request.keywords, "boolean keywords have no positive clause");
					return Ok(Vec::new());
				}
			}
		} else {
			let mut terms = analyze(&self.index, f.title_content, request.keywords)?;
			if mode.expands_query() {
				terms = self.expand(&searcher, request.record_type, terms)?;
			}
			match (terms_query(f.title, &terms), terms_query(f.title_content, &terms)) {
				(Some(title), Some(combined)) => (title, combined),
				_ => {
					debug!(keywords = request.keywords, "no searchable terms in keywords");
					return Ok(Vec::new());
				}
			}
		};

		let title_scores: HashMap<DocAddress, f32> = searcher
			.search(&self.restrict(request.record_type, title_query), &TopDocs::with_limit(limit))?
			.into_iter()
			.map(|(score, address)| (address, score))
			.collect();
		let matched = searcher.search(&self.restrict(request.record_type, combined_query), &TopDocs::with_limit(limit))?;

		let mut scores = Vec::with_capacity(matched.len());
		for (score, address) in matched {
			let doc: TantivyDocument = searcher.doc(address)?;
			let record_id = doc
				.get_first(f.record_id)
				.and_then(|v| v.as_u64())
				.ok_or_else(|| anyhow!("index row without record id"))?;
			scores.push(MatchScore {
				record_id,
				title_score: title_scores.get(&address).copied().unwrap_or(0.0),
				title_content_score: score,
			});
		}
		debug!(record_type = request.record_type, mode = %mode, hits = scores.len(), "matched index rows");
		Ok(scores)
	}

	/// `None` when nothing in `keywords` can select a row: a query made only
	/// of exclusions matches nothing.
	fn boolean_query(&self, field: Field, keywords: &BooleanKeywords) -> Result<Option<Box<dyn Query>>> {
		if !keywords.has_positive_clause() {
			return Ok(None);
		}
		let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
		if !keywords.positive.is_empty() {
			let occur = if keywords.required { Occur::Must } else { Occur::Should };
			clauses.push((occur, self.parse_lenient(field, &keywords.positive.join(" "))));
		}
		if !keywords.negative.is_empty() {
			clauses.push((Occur::MustNot, self.parse_lenient(field, &keywords.negative.join(" "))));
		}
		for (occur, stem) in &keywords.prefixes {
			let pattern = format!("{}.*", regex::escape(stem));
			let prefix: Box<dyn Query> = Box::new(RegexQuery::from_pattern(&pattern, field)?);
			clauses.push((*occur, prefix));
		}
		Ok(Some(Box::new(BooleanQuery::new(clauses))))
	}

	fn parse_lenient(&self, field: Field, keywords: &str) -> Box<dyn Query> {
		let parser = QueryParser::for_index(&self.index, vec![field]);
		let (query, errors) = parser.parse_query_lenient(keywords);
		if !errors.is_empty() {
			warn!(keywords, errors = errors.len(), "ignored malformed boolean syntax");
		}
		query
	}

	/// Only rows of `record_type` match; the filter adds nothing to the score.
	fn restrict(&self, record_type: &str, query: Box<dyn Query>) -> BooleanQuery {
		let term = TermQuery::new(Term::from_field_text(self.fields.record_type, record_type), IndexRecordOption::Basic);
		let filter: Box<dyn Query> = Box::new(ConstScoreQuery::new(Box::new(term), 0.0));
		BooleanQuery::new(vec![(Occur::Must, filter), (Occur::Must, query)])
	}

	fn expand(&self, searcher: &Searcher, record_type: &str, mut terms: Vec<String>) -> Result<Vec<String>> {
		let f = self.fields;
		let Some(query) = terms_query(f.title_content, &terms) else {
			return Ok(terms);
		};
		let top = searcher.search(&self.restrict(record_type, query), &TopDocs::with_limit(EXPANSION_DOCS))?;
		let initial = terms.len();
		'docs: for (_, address) in top {
			let doc: TantivyDocument = searcher.doc(address)?;
			for field in [f.title, f.content] {
				let text = doc.get_first(field).and_then(|v| v.as_str()).unwrap_or_default();
				for term in analyze(&self.index, f.title_content, text)? {
					if terms.len() - initial == EXPANSION_TERMS {
						break 'docs;
					}
					if !terms.contains(&term) {
						terms.push(term);
					}
				}
			}
		}
		debug!(added = terms.len() - initial, "expanded query terms");
		Ok(terms)
	}
}

/// Boolean-mode keywords split by operator.
///
/// `-word` and `-"phrase"` go to `negative` (stored without the `-`), a
/// trailing `*` makes a lowercase prefix stem, everything else stays in
/// `positive` with its `+` intact for the query grammar.
#[derive(Debug, Default, PartialEq)]
struct BooleanKeywords {
	positive: Vec<String>,
	negative: Vec<String>,
	prefixes: Vec<(Occur, String)>,
	/// Some positive word carries `+`.
	required: bool,
}

impl BooleanKeywords {
	fn parse(keywords: &str) -> Self {
		let mut parsed = Self::default();
		for word in boolean_words(keywords) {
			let (occur, bare) = if let Some(rest) = word.strip_prefix('+') {
				(Occur::Must, rest)
			} else if let Some(rest) = word.strip_prefix('-') {
				(Occur::MustNot, rest)
			} else {
				(Occur::Should, word.as_str())
			};
			if !bare.chars().any(char::is_alphanumeric) {
				continue;
			}
			match bare.strip_suffix('*') {
				Some(stem) if !stem.is_empty() && !stem.contains('"') => parsed.prefixes.push((occur, stem.to_lowercase())),
				_ if occur == Occur::MustNot => parsed.negative.push(bare.to_string()),
				_ => {
					parsed.required |= occur == Occur::Must;
					parsed.positive.push(word.clone());
				}
			}
		}
		parsed
	}

	fn has_positive_clause(&self) -> bool {
		!self.positive.is_empty() || self.prefixes.iter().any(|(occur, _)| *occur != Occur::MustNot)
	}
}

/// Whitespace-separated words, keeping double-quoted phrases whole.
fn boolean_words(keywords: &str) -> Vec<String> {
	let mut words = Vec::new();
	let mut current = String::new();
	let mut quoted = false;
	for ch in keywords.chars() {
		match ch {
			'"' => {
				quoted = !quoted;
				current.push(ch);
			}
			c if c.is_whitespace() && !quoted => {
				if !current.is_empty() {
					words.push(std::mem::take(&mut current));
				}
			}
			c => current.push(c),
		}
	}
	if !current.is_empty() {
		words.push(current);
	}
	words
}

fn terms_query(field: Field, terms: &[String]) -> Option<Box<dyn Query>> {
	if terms.is_empty() {
		return None;
	}
	let clauses: Vec<(Occur, Box<dyn Query>)> = terms
		.iter()
		.map(|term| {
			let query: Box<dyn Query> = Box::new(TermQuery::new(Term::from_field_text(field, term), IndexRecordOption::WithFreqs));
			(Occur::Should, query)
		})
		.collect();
	Some(Box::new(BooleanQuery::new(clauses)))
}

impl FullTextEngine for TantivySearchEngine {
	fn match_scores(&self, request: &MatchRequest<'_>) -> searchable_core::Result<Vec<MatchScore>> { Ok(self.scores(request)?) }
}
