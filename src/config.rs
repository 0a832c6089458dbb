use crate::search::SearchConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Search subsystem configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Full-reindex migration configuration
    #[serde(default)]
    pub migration: MigrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Records fetched from the store and submitted per bulk operation
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Optional JSON seed file loaded into the store before reindexing
    #[serde(default)]
    pub seed_path: Option<PathBuf>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            seed_path: None,
        }
    }
}

fn default_batch_size() -> u32 {
    1000
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: SEARCHIFY_)
            .add_source(
                config::Environment::with_prefix("SEARCHIFY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_embedded_defaults() {
        let config = Config::load().expect("embedded defaults must parse");
        assert!(config.migration.batch_size > 0);
        assert!(config.search.max_results > 0);
    }
}
