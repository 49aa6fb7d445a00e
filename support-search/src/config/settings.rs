//! Process settings read from the environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use support_search_pipeline::{IndexerConfig, RetryPolicy};
use support_search_repository::config::{DEFAULT_ENGINE_URL, DEFAULT_INDEX_PREFIX};
use support_search_repository::EngineConfig;
use support_search_shared::locale::{DEFAULT_LOCALE, DEFAULT_SUPPORTED_LOCALES};
use support_search_shared::LocaleSettings;
use thiserror::Error;

const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_BULK_CHUNK_SIZE: usize = 500;
const DEFAULT_BULK_MAX_RETRIES: u32 = 3;
const DEFAULT_JOB_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_JOB_BACKOFF_SECS: u64 = 5;

/// A setting that is present but unusable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    pub key: String,
    pub value: String,
    pub reason: String,
}

impl ConfigError {
    fn new(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {}", other)),
        }
    }
}

/// Everything the binary needs to wire its dependencies.
#[derive(Debug, Clone)]
pub struct Settings {
    pub engine: EngineConfig,
    /// Environment prefix of physical index names.
    pub index_prefix: String,
    pub indexer: IndexerConfig,
    /// Allow plugin-backed analyzers.
    pub use_plugins: bool,
    pub locales: LocaleSettings,
    /// Directory with `all.txt` and `{locale}.txt` synonym files.
    pub synonyms_dir: Option<PathBuf>,
    /// Directory of JSON entity exports backing the entity stores.
    pub fixtures_dir: Option<PathBuf>,
    pub job_policy: RetryPolicy,
    pub log_format: LogFormat,
}

impl Settings {
    /// Load `.env`, then read the process environment.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: engine URL (default: http://localhost:9200)
    /// - `ES_INDEX_PREFIX`: index name prefix (default: dev)
    /// - `ES_TIMEOUT_SECS`, `ES_BULK_CHUNK_SIZE`, `ES_BULK_MAX_RETRIES`
    /// - `ES_USE_PLUGINS`, `ES_REFRESH_ON_WRITE`: booleans (default: false)
    /// - `SUMO_LANGUAGES`, `SUMO_DEFAULT_LANGUAGE`: supported and default locales
    /// - `SYNONYMS_DIR`, `FIXTURES_DIR`: optional directories
    /// - `JOB_MAX_ATTEMPTS`, `JOB_BACKOFF_SECS`: job retry policy
    /// - `LOG_FORMAT`: `text` or `json`
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let url = var("OPENSEARCH_URL").unwrap_or_else(|| DEFAULT_ENGINE_URL.to_string());
        let timeout = Duration::from_secs(parsed(&var, "ES_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
        if timeout.is_zero() {
            return Err(ConfigError::new("ES_TIMEOUT_SECS", "0", "must be positive"));
        }

        let chunk_size = parsed(&var, "ES_BULK_CHUNK_SIZE", DEFAULT_BULK_CHUNK_SIZE)?;
        if chunk_size == 0 {
            return Err(ConfigError::new("ES_BULK_CHUNK_SIZE", "0", "must be positive"));
        }

        let languages = var("SUMO_LANGUAGES").unwrap_or_else(|| DEFAULT_SUPPORTED_LOCALES.join(","));
        let default_language =
            var("SUMO_DEFAULT_LANGUAGE").unwrap_or_else(|| DEFAULT_LOCALE.to_string());
        let locales = LocaleSettings::parse(&languages, &default_language)
            .map_err(|e| ConfigError::new("SUMO_LANGUAGES", &languages, e.to_string()))?;

        let job_max_attempts = parsed(&var, "JOB_MAX_ATTEMPTS", DEFAULT_JOB_MAX_ATTEMPTS)?;
        if job_max_attempts == 0 {
            return Err(ConfigError::new("JOB_MAX_ATTEMPTS", "0", "must be positive"));
        }

        Ok(Self {
            engine: EngineConfig::new(url).with_timeout(timeout),
            index_prefix: var("ES_INDEX_PREFIX").unwrap_or_else(|| DEFAULT_INDEX_PREFIX.to_string()),
            indexer: IndexerConfig {
                timeout,
                chunk_size,
                max_retries: parsed(&var, "ES_BULK_MAX_RETRIES", DEFAULT_BULK_MAX_RETRIES)?,
                refresh: flag(&var, "ES_REFRESH_ON_WRITE")?,
            },
            use_plugins: flag(&var, "ES_USE_PLUGINS")?,
            locales,
            synonyms_dir: var("SYNONYMS_DIR").map(PathBuf::from),
            fixtures_dir: var("FIXTURES_DIR").map(PathBuf::from),
            job_policy: RetryPolicy {
                max_attempts: job_max_attempts,
                backoff: Duration::from_secs(parsed(
                    &var,
                    "JOB_BACKOFF_SECS",
                    DEFAULT_JOB_BACKOFF_SECS,
                )?),
            },
            log_format: parsed(&var, "LOG_FORMAT", LogFormat::Text)?,
        })
    }
}

fn parsed<T, F>(var: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::new(key, &value, e.to_string())),
        None => Ok(default),
    }
}

fn flag<F>(var: &F, key: &str) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        None => Ok(false),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::new(key, &value, "expected a boolean")),
        },
    }
}
