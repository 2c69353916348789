//! Keyword cleaners applied to raw search input before it reaches the
//! full-text predicate.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::mode::SearchMode;

/// A pure transform over the keyword string.
pub trait KeywordCleaner: Send + Sync {
    fn name(&self) -> &'static str;
    fn clean(&self, keywords: &str, mode: Option<SearchMode>) -> String;
}

/// Replaces `@` with a space so both halves of an address stay matchable
/// word tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmailCleaner;

impl KeywordCleaner for EmailCleaner {
    fn name(&self) -> &'static str { "email" }

    fn clean(&self, keywords: &str, _mode: Option<SearchMode>) -> String { keywords.replace('@', " ") }
}

/// Resolves a configured cleaner name. Accepts the short name or the type name.
pub fn builtin_cleaner(name: &str) -> Option<Arc<dyn KeywordCleaner>> {
    match name.trim() {
        "email" | "EmailCleaner" => Some(Arc::new(EmailCleaner)),
        _ => None,
    }
}

/// Mode → ordered cleaners, built once at startup.
#[derive(Clone, Default)]
pub struct CleanerRegistry {
    by_mode: HashMap<SearchMode, Vec<Arc<dyn KeywordCleaner>>>,
}

impl CleanerRegistry {
    pub fn new() -> Self { Self::default() }

    /// Build from `mode name → [cleaner name]`. Unknown modes or cleaner
    /// names are configuration errors.
    pub fn from_config(cleaners: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut registry = Self::new();
        for (mode_name, names) in cleaners {
            let mode: SearchMode = mode_name.parse()?;
            for name in names {
                let cleaner = builtin_cleaner(name)
                    .ok_or_else(|| Error::InvalidConfig(format!("unknown keyword cleaner '{name}' for mode '{mode}'")))?;
                registry.register(mode, cleaner);
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, mode: SearchMode, cleaner: Arc<dyn KeywordCleaner>) -> &mut Self {
        self.by_mode.entry(mode).or_default().push(cleaner);
        self
    }

    pub fn cleaners_for(&self, mode: SearchMode) -> &[Arc<dyn KeywordCleaner>] {
        self.by_mode.get(&mode).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Thread `keywords` through every cleaner registered for `mode`, in order.
    pub fn clean(&self, keywords: &str, mode: Option<SearchMode>) -> String {
        let Some(mode) = mode else { return keywords.to_string() };
        self.cleaners_for(mode).iter().fold(keywords.to_string(), |current, cleaner| {
            let cleaned = cleaner.clean(&current, Some(mode));
            debug!(cleaner = cleaner.name(), %mode, before = %current, after = %cleaned, "cleaned keywords");
            cleaned
        })
    }
}

impl std::fmt::Debug for CleanerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: BTreeMap<SearchMode, Vec<&'static str>> =
            self.by_mode.iter().map(|(mode, list)| (*mode, list.iter().map(|c| c.name()).collect())).collect();
        f.debug_struct("CleanerRegistry").field("by_mode", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;
    impl KeywordCleaner for Upper {
        fn name(&self) -> &'static str { "upper" }
        fn clean(&self, keywords: &str, _mode: Option<SearchMode>) -> String { keywords.to_uppercase() }
    }

    struct Suffix;
    impl KeywordCleaner for Suffix {
        fn name(&self) -> &'static str { "suffix" }
        fn clean(&self, keywords: &str, _mode: Option<SearchMode>) -> String { format!("{keywords}!") }
    }

    #[test]
    fn email_cleaner_replaces_at_sign() {
        assert_eq!(EmailCleaner.clean("a@b.com", Some(SearchMode::Boolean)), "a b.com");
    }

    #[test]
    fn no_mode_or_unregistered_mode_is_identity() {
        let mut registry = CleanerRegistry::new();
        registry.register(SearchMode::Boolean, Arc::new(EmailCleaner));
        assert_eq!(registry.clean("x@y.z", None), "x@y.z");
        assert_eq!(registry.clean("x@y.z", Some(SearchMode::NaturalLanguage)), "x@y.z");
        assert_eq!(registry.clean("x@y.z", Some(SearchMode::Boolean)), "x y.z");
    }

    #[test]
    fn cleaners_apply_in_registration_order() {
        let mut registry = CleanerRegistry::new();
        registry.register(SearchMode::Boolean, Arc::new(Suffix)).register(SearchMode::Boolean, Arc::new(Upper));
        assert_eq!(registry.clean("ab", Some(SearchMode::Boolean)), "AB!");
    }

    #[test]
    fn config_resolves_names_and_rejects_unknown() {
        let mut config = BTreeMap::new();
        config.insert("boolean".to_string(), vec!["EmailCleaner".to_string()]);
        let registry = CleanerRegistry::from_config(&config).expect("registry");
        assert_eq!(registry.cleaners_for(SearchMode::Boolean).len(), 1);

        config.insert("boolean".to_string(), vec!["soundex".to_string()]);
        assert!(matches!(CleanerRegistry::from_config(&config), Err(Error::InvalidConfig(_))));

        let mut bad_mode = BTreeMap::new();
        bad_mode.insert("fuzzy".to_string(), vec!["email".to_string()]);
        assert!(CleanerRegistry::from_config(&bad_mode).is_err());
    }
}
