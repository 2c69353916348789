//! Per-field score weights.
//!
//! Weights may arrive as numbers or as strings written with a locale decimal
//! comma (`"1,5"`); both normalize to the same `f64` and always render with
//! a `.` decimal point in score expressions.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::{Error, Result};

pub const DEFAULT_TITLE_WEIGHT: f64 = 1.5;
pub const DEFAULT_CONTENT_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Weight(f64);

impl Weight {
    pub fn new(value: f64) -> Result<Self> {
        if value.is_finite() {
            Ok(Self(value))
        } else {
            Err(Error::InvalidConfig(format!("search weight must be finite, got {value}")))
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().replace(',', ".");
        let value = normalized
            .parse::<f64>()
            .map_err(|e| Error::InvalidConfig(format!("invalid search weight '{raw}': {e}")))?;
        Self::new(value)
    }

    pub fn value(self) -> f64 { self.0 }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }
        let weight = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Weight::new(n),
            Raw::Text(s) => Weight::parse(&s),
        };
        weight.map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchWeights {
    pub title: Weight,
    pub content: Weight,
}

impl Default for SearchWeights {
    fn default() -> Self { Self { title: Weight(DEFAULT_TITLE_WEIGHT), content: Weight(DEFAULT_CONTENT_WEIGHT) } }
}

impl SearchWeights {
    pub fn score(&self, title_score: f64, title_content_score: f64) -> f64 {
        self.title.value() * title_score + self.content.value() * title_content_score
    }
}
