//! Command line arguments.

use crate::error::CliResult;
use clap::Parser;
use scrobble_config::{Config, ConfigLoader};
use std::path::PathBuf;
use tracing::debug;

/// Streamgraph aggregates for a listening history.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Record file, overriding `data.path`
    #[arg(short, long)]
    pub data: Option<String>,

    /// Number of ranked categories, overriding `ranking.top_k`
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Log level, overriding `logging.level`
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Load the configuration file (or defaults) and apply flag overrides.
    ///
    /// Flags win over environment variables, which win over the file.
    pub fn load_config(&self) -> CliResult<Config> {
        let mut config = match &self.config {
            Some(path) => ConfigLoader::load_config(path)?,
            None => ConfigLoader::load()?,
        };
        self.apply(&mut config);
        config.validate_all().map_err(scrobble_config::ConfigError::from)?;
        Ok(config)
    }

    /// Apply flag overrides to an already loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(data) = &self.data {
            config.data.path.clone_from(data);
        }
        if let Some(top_k) = self.top_k {
            config.ranking.top_k = top_k;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
        debug!(?self, "Applied command line overrides");
    }
}
