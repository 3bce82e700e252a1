//! Configuration loading, validation, and management for FieldVoice.
//!
//! Loads configuration from `~/.fieldvoice/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.fieldvoice/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the generation/embedding endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of an OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Model used for classification, translation and answers
    #[serde(default = "default_model")]
    pub model: String,

    /// Model used to embed product search queries
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Answer generation temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_api_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.7
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("pipeline", &self.pipeline)
            .field("search", &self.search)
            .field("store", &self.store)
            .finish()
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

/// Turn pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Language classification and answer generation run in
    #[serde(default = "default_working_language")]
    pub working_language: String,

    /// Prior messages shown to the intent classifier
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Extra attempts for transient provider failures (0 = call once)
    #[serde(default)]
    pub max_retries: u32,

    /// Base delay between retries, multiplied by the attempt number
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_working_language() -> String {
    "en".into()
}
fn default_history_limit() -> usize {
    10
}
fn default_retry_backoff_ms() -> u64 {
    250
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            working_language: default_working_language(),
            history_limit: default_history_limit(),
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Product index settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Elasticsearch base URL
    #[serde(default = "default_search_url")]
    pub url: String,

    /// Elasticsearch API key, if the cluster requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_index")]
    pub index: String,

    /// Results requested from the kNN search
    #[serde(default = "default_k")]
    pub k: usize,

    /// Candidate pool examined by the kNN search
    #[serde(default = "default_num_candidates")]
    pub num_candidates: usize,

    /// Fuzzy name match cut-off (0 = exact only, 1 = match anything)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
}

fn default_search_url() -> String {
    "http://localhost:9200".into()
}
fn default_index() -> String {
    "khula_products".into()
}
fn default_k() -> usize {
    100
}
fn default_num_candidates() -> usize {
    1000
}
fn default_fuzzy_threshold() -> f64 {
    0.5
}

impl std::fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchConfig")
            .field("url", &self.url)
            .field("api_key", &redact(&self.api_key))
            .field("index", &self.index)
            .field("k", &self.k)
            .field("num_candidates", &self.num_candidates)
            .field("fuzzy_threshold", &self.fuzzy_threshold)
            .finish()
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: default_search_url(),
            api_key: None,
            index: default_index(),
            k: default_k(),
            num_candidates: default_num_candidates(),
            fuzzy_threshold: default_fuzzy_threshold(),
        }
    }
}

/// Conversation persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database file; defaults to `~/.fieldvoice/conversations.db`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

fn default_store_backend() -> String {
    "sqlite".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: None,
        }
    }
}

impl StoreConfig {
    /// The SQLite path to open, falling back to the config directory.
    pub fn sqlite_path(&self) -> String {
        self.path.clone().unwrap_or_else(|| {
            AppConfig::config_dir()
                .join("conversations.db")
                .display()
                .to_string()
        })
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.fieldvoice/config.toml).
    ///
    /// Environment overrides:
    /// - `FIELDVOICE_API_KEY` (highest priority), then `OPENAI_API_KEY`
    /// - `FIELDVOICE_MODEL`
    /// - `FIELDVOICE_SEARCH_URL`, `FIELDVOICE_SEARCH_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("FIELDVOICE_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("FIELDVOICE_MODEL") {
            config.model = model;
        }

        if let Ok(url) = std::env::var("FIELDVOICE_SEARCH_URL") {
            config.search.url = url;
        }

        if config.search.api_key.is_none() {
            config.search.api_key = std::env::var("FIELDVOICE_SEARCH_API_KEY").ok();
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".fieldvoice")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.pipeline.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.history_limit must be > 0".into(),
            ));
        }

        if self.search.k == 0 || self.search.num_candidates < self.search.k {
            return Err(ConfigError::ValidationError(
                "search.num_candidates must be >= search.k > 0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.search.fuzzy_threshold) {
            return Err(ConfigError::ValidationError(
                "search.fuzzy_threshold must be between 0.0 and 1.0".into(),
            ));
        }

        if !matches!(self.store.backend.as_str(), "sqlite" | "memory") {
            return Err(ConfigError::ValidationError(format!(
                "unknown store.backend '{}' (expected sqlite or memory)",
                self.store.backend
            )));
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: default_api_url(),
            model: default_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            pipeline: PipelineConfig::default(),
            search: SearchConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.history_limit, 10);
        assert_eq!(config.pipeline.working_language, "en");
        assert_eq!(config.search.k, 100);
        assert_eq!(config.search.num_candidates, 1000);
        assert_eq!(config.search.index, "khula_products");
        assert_eq!(config.pipeline.max_retries, 0);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model, config.model);
        assert_eq!(parsed.search.k, config.search.k);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn candidate_pool_smaller_than_k_rejected() {
        let mut config = AppConfig::default();
        config.search.num_candidates = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_store_backend_rejected() {
        let mut config = AppConfig::default();
        config.store.backend = "postgres".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model, "gpt-4o-mini");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
model = "gpt-4o"

[search]
index = "products_v2"
fuzzy_threshold = 0.3

[store]
backend = "memory"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.search.index, "products_v2");
        assert!((config.search.fuzzy_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.search.k, 100);
        assert_eq!(config.store.backend, "memory");
        assert_eq!(config.pipeline.history_limit, 10);
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig {
            api_key: Some("sk-secret".into()),
            ..AppConfig::default()
        };
        config.search.api_key = Some("es-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("es-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("khula_products"));
        assert!(toml_str.contains("gpt-4o-mini"));
    }
}
