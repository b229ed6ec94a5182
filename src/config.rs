use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::dataset::{DEFAULT_DATASET, Dataset};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV: &str = "MOVE_DIVISION_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Path to the repository's SQLite database
    pub database: PathBuf,
    /// Dataset searched for records to move
    #[serde(default = "default_dataset")]
    pub dataset: String,
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub repositories: HashMap<String, RepositoryConfig>,
}

impl Config {
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            // Use XDG config directory on Linux
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("move-division")
        } else {
            // Use home directory with dot prefix on Windows/Mac
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".move-division")
        };
        Ok(config_dir)
    }

    /// Pick the configuration file: explicit path, then environment, then default
    pub fn resolve_path(explicit: Option<&Path>) -> Result<(PathBuf, bool)> {
        if let Some(path) = explicit {
            return Ok((path.to_path_buf(), true));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            if !path.is_empty() {
                return Ok((PathBuf::from(path), true));
            }
        }
        Ok((Self::get_config_dir()?.join("config.toml"), false))
    }

    /// Load the configuration
    ///
    /// A missing default file yields an empty configuration; a missing
    /// explicitly named file is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let (config_path, required) = Self::resolve_path(explicit)?;
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            if required {
                anyhow::bail!("Config file not found: {:?}", config_path);
            }
            info!("Config file doesn't exist, using empty config");
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let mut config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        for (id, repository) in &config.repositories {
            Dataset::named(&repository.dataset).with_context(|| {
                format!("Invalid dataset for repository '{}' in {:?}", id, config_path)
            })?;
        }

        // Relative database paths are relative to the config file
        if let Some(base) = config_path.parent() {
            for repository in config.repositories.values_mut() {
                if repository.database.is_relative() {
                    repository.database = base.join(&repository.database);
                }
            }
        }

        debug!(
            "Loaded config with {} repositories",
            config.repositories.len()
        );
        Ok(config)
    }

    pub fn repository(&self, repository_id: &str) -> Result<&RepositoryConfig> {
        self.repositories
            .get(repository_id)
            .ok_or_else(|| anyhow::anyhow!("Repository '{}' is not configured", repository_id))
    }

    /// Dataset to search in the given repository, falling back to the default
    pub fn dataset_for(&self, repository_id: &str) -> &str {
        self.repositories
            .get(repository_id)
            .map(|r| r.dataset.as_str())
            .unwrap_or(DEFAULT_DATASET)
    }
}
