//! TOML configuration parsing and validation.
//!
//! The configuration is read once per process by [`load_config`] and passed
//! explicitly into the extractor, the store and the summarizer factory.
//! Everything that ends up inside SQL text (table and column identifiers) is
//! validated here, so later stages never see an unchecked identifier.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variable that overrides `[db].path`.
pub const DATABASE_FILE_ENV: &str = "DATABASE_FILE";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/summaries.sqlite")
}
fn default_busy_timeout_secs() -> u64 {
    10
}

/// Physical table layout of the summary store.
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    pub table: String,
    pub columns: ColumnNames,
}

/// Mapping from the six logical column names to physical ones.
///
/// Every field is required: a config file missing one of them fails to
/// parse, before any database work is attempted.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ColumnNames {
    pub id: String,
    pub source_url: String,
    pub summary_text: String,
    pub style: String,
    pub language: String,
    pub created_at: String,
}

impl ColumnNames {
    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("id", &self.id),
            ("source_url", &self.source_url),
            ("summary_text", &self.summary_text),
            ("style", &self.style),
            ("language", &self.language),
            ("created_at", &self.created_at),
        ]
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_fetch_timeout_secs() -> u64 {
    15
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_summarizer_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_summarizer_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}
fn default_summarizer_timeout_secs() -> u64 {
    60
}

/// Load, apply environment overrides, and validate the configuration file.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config = parse_config(&content)?;

    if let Ok(db_file) = std::env::var(DATABASE_FILE_ENV) {
        if !db_file.trim().is_empty() {
            config.db.path = PathBuf::from(db_file);
        }
    }

    Ok(config)
}

/// Parse and validate configuration text without touching the environment.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.db.busy_timeout_secs == 0 {
        bail!("db.busy_timeout_secs must be > 0");
    }
    if config.fetch.timeout_secs == 0 {
        bail!("fetch.timeout_secs must be > 0");
    }
    if config.summarizer.timeout_secs == 0 {
        bail!("summarizer.timeout_secs must be > 0");
    }

    if !is_identifier(&config.store.table) {
        bail!(
            "store.table '{}' is not a valid SQL identifier",
            config.store.table
        );
    }

    let mut seen = HashSet::new();
    for (logical, physical) in config.store.columns.entries() {
        if !is_identifier(physical) {
            bail!(
                "store.columns.{} '{}' is not a valid SQL identifier",
                logical,
                physical
            );
        }
        if !seen.insert(physical.to_ascii_lowercase()) {
            bail!(
                "store.columns.{} '{}' duplicates another column name",
                logical,
                physical
            );
        }
    }

    match config.summarizer.provider.as_str() {
        "gemini" => {}
        other => bail!("Unknown summarizer provider: '{}'. Must be gemini.", other),
    }

    Ok(())
}

/// Allow-list for identifiers interpolated into SQL: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
