//! Flattening of a record's configured columns into one indexable string.
//!
//! Only word tokens survive normalization: every run of characters that is
//! not a Unicode letter, Unicode number or `_` becomes a single space, since
//! the full-text engine indexes nothing else.
//!
//! Extraction never fails. A missing field, an unknown relation or a null
//! to-one hop contributes an empty string and the remaining columns are
//! still extracted.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::column::Column;
use crate::traits::Entity;
use crate::types::Related;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_]+").expect("Invalid non-word regex"));

/// Separator between the values gathered from a to-many hop.
pub const MANY_SEPARATOR: &str = ", ";

pub struct TextExtractor;

impl TextExtractor {
    pub fn extract<E: Entity + ?Sized>(entity: &E, columns: &[Column]) -> String {
        let values: Vec<String> = columns
            .iter()
            .map(|column| Self::column_value(entity, column))
            .filter(|value| !value.is_empty())
            .collect();
        Self::normalize(&values.join(" "))
    }

    /// Raw (un-normalized) contribution of a single column.
    pub fn column_value<E: Entity + ?Sized>(entity: &E, column: &Column) -> String {
        match column {
            Column::Field(name) => Self::field_string(entity, name),
            Column::Path(path) => Self::resolve(entity, &path.relations, &path.field),
        }
    }

    pub fn normalize(text: &str) -> String { NON_WORD.replace_all(text, " ").into_owned() }

    fn field_string<E: Entity + ?Sized>(entity: &E, name: &str) -> String {
        entity.field(name).map(|value| value.to_index_string()).unwrap_or_default()
    }

    fn resolve<E: Entity + ?Sized>(entity: &E, relations: &[String], field: &str) -> String {
        let Some((relation, remaining)) = relations.split_first() else {
            return Self::field_string(entity, field);
        };
        match entity.related(relation) {
            Related::Absent => {
                trace!(relation = relation.as_str(), "relation absent, contributing empty value");
                String::new()
            }
            Related::One(next) => Self::resolve(next, remaining, field),
            Related::Many(items) => items
                .into_iter()
                .map(|item| Self::resolve(item, remaining, field))
                .collect::<Vec<_>>()
                .join(MANY_SEPARATOR),
        }
    }
}
