use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::cleaner::CleanerRegistry;
use crate::error::{Error, Result};
use crate::mode::SearchMode;
use crate::weights::SearchWeights;

pub const DEFAULT_TABLE_NAME: &str = "searchable_index";
pub const DEFAULT_COMMAND_PREFIX: &str = "searchable";
pub const ENV_PREFIX: &str = "SEARCHABLE_";

/// Recognized options of the search index.
///
/// - `table_name`: index relation targeted by generated SQL
/// - `db_connection`: store identifier; `None` means the default store
/// - `command_prefix`: prefix of the batch tooling command names
/// - `weight`: per-field score weights
/// - `cleaners`: search mode name → ordered keyword cleaner names
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchableConfig {
    pub table_name: String,
    pub db_connection: Option<String>,
    pub command_prefix: String,
    pub weight: SearchWeights,
    pub cleaners: BTreeMap<String, Vec<String>>,
}

impl Default for SearchableConfig {
    fn default() -> Self {
        let mut cleaners = BTreeMap::new();
        cleaners.insert(SearchMode::Boolean.name().to_string(), vec!["email".to_string()]);
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            db_connection: None,
            command_prefix: DEFAULT_COMMAND_PREFIX.to_string(),
            weight: SearchWeights::default(),
            cleaners,
        }
    }
}

impl SearchableConfig {
    /// Defaults, then `searchable.toml`, then `searchable.<env>.toml`, then
    /// `SEARCHABLE_*` variables (`SEARCHABLE_WEIGHT__TITLE=2`).
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Self::default())).merge(Toml::file("searchable.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("searchable.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("searchable.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("searchable.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(&figment)
    }

    pub fn from_figment(figment: &Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document layered over the defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_figment(&Figment::from(Serialized::defaults(Self::default())).merge(Toml::string(toml)))
    }

    fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(Error::InvalidConfig("table_name must not be empty".to_string()));
        }
        if self.command_prefix.trim().is_empty() {
            return Err(Error::InvalidConfig("command_prefix must not be empty".to_string()));
        }
        self.cleaner_registry().map(|_| ())
    }

    /// Cleaners resolved from `cleaners`.
    pub fn cleaner_registry(&self) -> Result<CleanerRegistry> { CleanerRegistry::from_config(&self.cleaners) }

    pub fn command_name(&self, command: &str) -> String { format!("{}:{}", self.command_prefix, command) }

    /// `db_connection` as a filesystem location, expanded and resolved against `base`.
    pub fn store_path(&self, base: &Path) -> Option<PathBuf> {
        self.db_connection.as_deref().filter(|s| !s.trim().is_empty()).map(|p| resolve_with_base(base, p))
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
