//! Configuration loading for the roster finder.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/roster/config.toml.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::RosterError;

/// Environment variable consulted when no API key is configured.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Embedding provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name (only "gemini" is supported)
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Model name (e.g., "text-embedding-004")
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// API key (usually loaded from env var, not stored in config file)
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Vector length every embedding must have.
    /// Must match the model; 768 for text-embedding-004.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts per embedding call before giving up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_embedding_provider() -> String {
    "gemini".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_dimension() -> usize {
    768
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_base_url: None,
            api_key: None,
            dimension: default_dimension(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl EmbeddingSettings {
    /// API key from config, falling back to GEMINI_API_KEY.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(GEMINI_API_KEY_ENV).ok())
            .filter(|k| !k.is_empty())
    }
}

/// Query-time settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuerySettings {
    /// Number of nearest neighbors fetched per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Top-two distance gap below which a result is ambiguous.
    /// Tuned for text-embedding-004 squared L2 distances; other models need
    /// their own value.
    #[serde(default = "default_tie_threshold")]
    pub tie_threshold: f32,
}

fn default_top_k() -> usize {
    3
}

fn default_tie_threshold() -> f32 {
    0.05
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            tie_threshold: default_tie_threshold(),
        }
    }
}

/// Index build settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Concurrent embedding requests during a build
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to the corpus export (groups + users)
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Directory holding the persisted index artifact
    #[serde(default = "default_index_dir")]
    pub index_dir: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub query: QuerySettings,

    #[serde(default)]
    pub build: BuildSettings,
}

fn default_corpus_path() -> String {
    "corpus.json".to_string()
}

fn default_index_dir() -> String {
    ProjectDirs::from("", "", "roster")
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./roster-index"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            index_dir: default_index_dir(),
            log_level: default_log_level(),
            embedding: EmbeddingSettings::default(),
            query: QuerySettings::default(),
            build: BuildSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/roster/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (ROSTER_*, nested keys separated by `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, RosterError> {
        let config_dir = ProjectDirs::from("", "", "roster")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("corpus_path", default_corpus_path())
            .map_err(|e| RosterError::Config(e.to_string()))?
            .set_default("index_dir", default_index_dir())
            .map_err(|e| RosterError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| RosterError::Config(e.to_string()))?
            .set_default("embedding.provider", default_embedding_provider())
            .map_err(|e| RosterError::Config(e.to_string()))?
            .set_default("embedding.model", default_embedding_model())
            .map_err(|e| RosterError::Config(e.to_string()))?
            .set_default("embedding.dimension", default_dimension() as i64)
            .map_err(|e| RosterError::Config(e.to_string()))?
            .set_default("query.top_k", default_top_k() as i64)
            .map_err(|e| RosterError::Config(e.to_string()))?
            .set_default("query.tie_threshold", default_tie_threshold() as f64)
            .map_err(|e| RosterError::Config(e.to_string()))?
            .set_default("build.workers", default_workers() as i64)
            .map_err(|e| RosterError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // ROSTER_INDEX_DIR, ROSTER_QUERY__TIE_THRESHOLD, ROSTER_EMBEDDING__MODEL, ...
        builder = builder.add_source(
            Environment::with_prefix("ROSTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| RosterError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| RosterError::Config(e.to_string()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), RosterError> {
        if self.query.top_k == 0 {
            return Err(RosterError::Config("query.top_k must be >= 1".to_string()));
        }
        if !(self.query.tie_threshold.is_finite() && self.query.tie_threshold > 0.0) {
            return Err(RosterError::Config(format!(
                "query.tie_threshold must be a positive number, got {}",
                self.query.tie_threshold
            )));
        }
        if self.embedding.dimension == 0 {
            return Err(RosterError::Config(
                "embedding.dimension must be > 0".to_string(),
            ));
        }
        if self.embedding.timeout_secs == 0 {
            return Err(RosterError::Config(
                "embedding.timeout_secs must be > 0".to_string(),
            ));
        }
        if self.build.workers == 0 {
            return Err(RosterError::Config("build.workers must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Index directory with a leading `~/` expanded.
    pub fn expanded_index_dir(&self) -> PathBuf {
        expand_home(&self.index_dir)
    }

    /// Corpus path with a leading `~/` expanded.
    pub fn expanded_corpus_path(&self) -> PathBuf {
        expand_home(&self.corpus_path)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.query.top_k, 3);
        assert!((settings.query.tie_threshold - 0.05).abs() < f32::EPSILON);
        assert_eq!(settings.embedding.dimension, 768);
        assert_eq!(settings.embedding.model, "text-embedding-004");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_with_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("roster.toml");
        std::fs::write(
            &path,
            "index_dir = \"/tmp/roster-test\"\n\n[query]\ntop_k = 5\ntie_threshold = 0.1\n",
        )
        .unwrap();

        let settings = Settings::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(settings.index_dir, "/tmp/roster-test");
        assert_eq!(settings.query.top_k, 5);
        assert!((settings.query.tie_threshold - 0.1).abs() < 1e-6);
        assert_eq!(settings.embedding.dimension, 768);
    }

    #[test]
    fn test_validation() {
        let mut settings = Settings::default();
        settings.query.top_k = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.query.tie_threshold = f32::NAN;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.build.workers = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_api_key_not_serialized() {
        let mut settings = Settings::default();
        settings.embedding.api_key = Some("secret".to_string());
        let json = serde_json::to_string(&settings).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_expand_home() {
        let mut settings = Settings::default();
        settings.index_dir = "/var/lib/roster".to_string();
        assert_eq!(settings.expanded_index_dir(), PathBuf::from("/var/lib/roster"));
    }
}
