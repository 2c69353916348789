use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Matching strategy understood by the full-text engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    NaturalLanguage,
    NaturalLanguageWithQueryExpansion,
    Boolean,
    QueryExpansion,
}

impl SearchMode {
    pub const ALL: [SearchMode; 4] = [
        SearchMode::NaturalLanguage,
        SearchMode::NaturalLanguageWithQueryExpansion,
        SearchMode::Boolean,
        SearchMode::QueryExpansion,
    ];

    /// Modifier appended inside `AGAINST (? ...)`.
    pub fn modifier(self) -> &'static str {
        match self {
            SearchMode::NaturalLanguage => "IN NATURAL LANGUAGE MODE",
            SearchMode::NaturalLanguageWithQueryExpansion => "IN NATURAL LANGUAGE MODE WITH QUERY EXPANSION",
            SearchMode::Boolean => "IN BOOLEAN MODE",
            SearchMode::QueryExpansion => "WITH QUERY EXPANSION",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SearchMode::NaturalLanguage => "natural_language",
            SearchMode::NaturalLanguageWithQueryExpansion => "natural_language_with_query_expansion",
            SearchMode::Boolean => "boolean",
            SearchMode::QueryExpansion => "query_expansion",
        }
    }

    pub fn expands_query(self) -> bool {
        matches!(self, SearchMode::NaturalLanguageWithQueryExpansion | SearchMode::QueryExpansion)
    }

    /// Unknown names yield `None`, which callers treat as the engine default.
    pub fn parse_lenient(s: &str) -> Option<Self> { s.parse().ok() }
}

impl FromStr for SearchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|mode| mode.name().eq_ignore_ascii_case(wanted) || mode.modifier().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::InvalidConfig(format!("unknown search mode '{wanted}'")))
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}
