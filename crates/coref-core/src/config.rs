//! Coref Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for an English coreference pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorefConfig {
    /// Rule pipeline configuration
    pub pipeline: PipelineConfig,

    /// Language resources code
    pub language: String,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for CorefConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            language: "en".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CorefConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Rule lists
        if let Ok(value) = std::env::var("COREF_SIEVES") {
            config.pipeline.sieves = parse_list(&value);
        }
        if let Ok(value) = std::env::var("COREF_CATCHERS") {
            config.pipeline.mention_catchers = parse_list(&value);
        }
        if let Ok(value) = std::env::var("COREF_FILTERS") {
            config.pipeline.mention_filters = parse_list(&value);
        }
        if let Ok(value) = std::env::var("COREF_PURGES") {
            config.pipeline.mention_purges = parse_list(&value);
        }

        // Extraction strategies
        if let Ok(value) = std::env::var("COREF_MENTION_EXTRACTOR") {
            config.pipeline.mention_extractor = value.trim().to_string();
        }
        if let Ok(value) = std::env::var("COREF_CANDIDATE_EXTRACTOR") {
            config.pipeline.candidate_extractor = value.trim().to_string();
        }

        // Flags
        if let Ok(value) = std::env::var("COREF_SOFT_FILTERS") {
            config.pipeline.soft_filters = parse_flag("COREF_SOFT_FILTERS", &value)?;
        }
        if let Ok(value) = std::env::var("COREF_SOFT_PURGES") {
            config.pipeline.soft_purges = parse_flag("COREF_SOFT_PURGES", &value)?;
        }
        if let Ok(value) = std::env::var("COREF_GOLD_BOUNDARIES") {
            config.pipeline.gold_boundaries = parse_flag("COREF_GOLD_BOUNDARIES", &value)?;
        }
        if let Ok(value) = std::env::var("COREF_META_INFO") {
            config.pipeline.meta_info = parse_flag("COREF_META_INFO", &value)?;
        }

        if let Ok(language) = std::env::var("COREF_LANGUAGE") {
            config.language = language;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = PipelineConfig::default();

        // Only override if env values differ from defaults
        let env = env_config.pipeline;
        if env.sieves != defaults.sieves {
            self.pipeline.sieves = env.sieves;
        }
        if env.mention_catchers != defaults.mention_catchers {
            self.pipeline.mention_catchers = env.mention_catchers;
        }
        if env.mention_filters != defaults.mention_filters {
            self.pipeline.mention_filters = env.mention_filters;
        }
        if env.mention_purges != defaults.mention_purges {
            self.pipeline.mention_purges = env.mention_purges;
        }
        if env.mention_extractor != defaults.mention_extractor {
            self.pipeline.mention_extractor = env.mention_extractor;
        }
        if env.candidate_extractor != defaults.candidate_extractor {
            self.pipeline.candidate_extractor = env.candidate_extractor;
        }

        // Flags only switch on from the environment
        self.pipeline.soft_filters |= env.soft_filters;
        self.pipeline.soft_purges |= env.soft_purges;
        self.pipeline.gold_boundaries |= env.gold_boundaries;
        self.pipeline.meta_info |= env.meta_info;

        if env_config.language != Self::default().language {
            self.language = env_config.language;
        }
        if env_config.logging.level != LoggingConfig::default().level {
            self.logging.level = env_config.logging.level;
        }

        Ok(self)
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Rule pipeline configuration
///
/// Every rule is referenced by its registry short name. Order matters:
/// catchers, filters and purges apply first-match-wins and sieves run
/// from the most to the least precise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Sieve passes in precision order
    pub sieves: Vec<String>,

    /// Catchers tried on each visited node
    pub mention_catchers: Vec<String>,

    /// Filters applied to caught mentions
    pub mention_filters: Vec<String>,

    /// Purges applied after resolution
    pub mention_purges: Vec<String>,

    /// Traversal strategy for the mention pass
    pub mention_extractor: String,

    /// Traversal strategy for the candidate pass
    pub candidate_extractor: String,

    /// Mark filtered mentions invalid instead of discarding them
    pub soft_filters: bool,

    /// Demote purged mentions to singletons instead of discarding them
    pub soft_purges: bool,

    /// Allocate gold mentions in the tree
    pub gold_boundaries: bool,

    /// Collect diagnostics
    pub meta_info: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sieves: vec![
                "ESM".to_string(),
                "RSM".to_string(),
                "SHM".to_string(),
                "PNM".to_string(),
            ],
            mention_catchers: vec![
                "NamedEntitiesCatcher".to_string(),
                "ConstituentCatcher".to_string(),
                "PronounCatcher".to_string(),
            ],
            mention_filters: vec![
                "InterjectionFilter".to_string(),
                "SameHeadFilter".to_string(),
            ],
            mention_purges: vec!["SingletonPurge".to_string()],
            mention_extractor: "breadth_first".to_string(),
            candidate_extractor: "breadth_first".to_string(),
            soft_filters: false,
            soft_purges: false,
            gold_boundaries: false,
            meta_info: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
