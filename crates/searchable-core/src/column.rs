//! Column definitions for title/content extraction.
//!
//! A column is either a direct field name (`"title"`) or a dotted relation
//! path (`"author.company.name"`). A dot at position zero does not make a
//! relation path; `".name"` reads the field literally named `.name`.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// `relations[0].relations[1]...field`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationPath {
    pub relations: Vec<String>,
    pub field: String,
}

impl RelationPath {
    fn parse(column: &str) -> Option<Self> {
        match column.find('.') {
            Some(pos) if pos > 0 => {
                let mut segments: Vec<String> = column.split('.').map(str::to_string).collect();
                let field = segments.pop()?;
                Some(Self { relations: segments, field })
            }
            _ => None,
        }
    }
}

impl fmt::Display for RelationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relations.join("."), self.field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Field(String),
    Path(RelationPath),
}

impl Column {
    pub fn parse(column: &str) -> Self {
        RelationPath::parse(column).map_or_else(|| Column::Field(column.to_string()), Column::Path)
    }

    pub fn is_relation(&self) -> bool { matches!(self, Column::Path(_)) }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(Error::InvalidConfig("empty searchable column name".to_string()));
        }
        Ok(Column::parse(s))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Field(name) => f.write_str(name),
            Column::Path(path) => fmt::Display::fmt(path, f),
        }
    }
}

/// Ordered title and content columns of one searchable record type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchableColumns {
    pub title: Vec<Column>,
    pub content: Vec<Column>,
}

impl SearchableColumns {
    pub fn new<T, C>(title: &[T], content: &[C]) -> Self
    where
        T: AsRef<str>,
        C: AsRef<str>,
    {
        Self {
            title: title.iter().map(|c| Column::parse(c.as_ref())).collect(),
            content: content.iter().map(|c| Column::parse(c.as_ref())).collect(),
        }
    }
}
