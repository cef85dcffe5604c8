//! Configuration loading with environment variable overrides.

use crate::schema::{Config, GranularityKind};
use chrono::Weekday;
use scrobble_common::ScrobbleError;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_VAR: &str = "SCROBBLE_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParse {
        /// Name of the offending variable.
        var: String,
        /// Underlying parse failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for ScrobbleError {
    fn from(err: ConfigError) -> Self {
        ScrobbleError::config_with_source("could not load configuration", err)
    }
}

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config = Self::parse_yaml(&content)?;

        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;

        info!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from the default locations, falling back to
    /// built-in defaults.
    ///
    /// Search order: `$SCROBBLE_CONFIG_PATH`, `scrobble.yaml`, `scrobble.yml`.
    pub fn load() -> Result<Config, ConfigError> {
        if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            return Self::load_config(config_path);
        }

        for candidate in ["scrobble.yaml", "scrobble.yml"] {
            if Path::new(candidate).exists() {
                return Self::load_config(candidate);
            }
        }

        debug!("No configuration file found, using defaults");
        let mut config = Config::default();
        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Parse YAML without applying overrides or validation
    pub fn parse_yaml(content: &str) -> Result<Config, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |var| env::var(var).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("SCROBBLE_DATA_PATH") {
            config.data.path = path;
        }

        if let Some(top_k) = lookup("SCROBBLE_TOP_K") {
            config.ranking.top_k = top_k.trim().parse().map_err(|e| ConfigError::EnvParse {
                var: "SCROBBLE_TOP_K".to_string(),
                source: Box::new(e),
            })?;
        }

        if let Some(granularity) = lookup("SCROBBLE_GRANULARITY") {
            config.bucketing.stream_granularity = parse_granularity(&granularity).ok_or_else(|| {
                ConfigError::EnvParse {
                    var: "SCROBBLE_GRANULARITY".to_string(),
                    source: format!("expected day, week or month, got '{granularity}'").into(),
                }
            })?;
        }

        if let Some(week_start) = lookup("SCROBBLE_WEEK_START") {
            config.bucketing.week_start =
                week_start.trim().parse::<Weekday>().map_err(|_| ConfigError::EnvParse {
                    var: "SCROBBLE_WEEK_START".to_string(),
                    source: format!("'{week_start}' is not a weekday").into(),
                })?;
        }

        if let Some(level) = lookup("SCROBBLE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(debounce) = lookup("SCROBBLE_DEBOUNCE_MS") {
            config.selection.debounce_ms = debounce.trim().parse().map_err(|e| ConfigError::EnvParse {
                var: "SCROBBLE_DEBOUNCE_MS".to_string(),
                source: Box::new(e),
            })?;
        }

        Ok(())
    }
}

fn parse_granularity(value: &str) -> Option<GranularityKind> {
    match value.trim().to_ascii_lowercase().as_str() {
        "day" | "daily" => Some(GranularityKind::Day),
        "week" | "weekly" => Some(GranularityKind::Week),
        "month" | "monthly" => Some(GranularityKind::Month),
        _ => None,
    }
}
