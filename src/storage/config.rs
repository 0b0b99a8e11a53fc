//! Configuration handling for Cadence
//!
//! Configuration is stored in `.cadence/config.toml` (workspace) and
//! `~/.config/cadence/config.toml` (global). Workspace values win over
//! global ones.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Cadence configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manager filled in when `task add` omits `--manager`
    pub default_manager: Option<String>,

    /// Assignee filled in when `task add` omits `--assignee`
    pub default_assignee: Option<String>,
}

impl Config {
    /// Loads the config for a workspace: global file first, then the
    /// workspace file layered on top
    pub fn for_workspace(root: &Path) -> Result<Self> {
        let mut config = Self::global()?.unwrap_or_default();

        let path = root.join(".cadence").join("config.toml");
        if let Some(workspace) = Self::read(&path)? {
            config.merge(workspace);
        }

        Ok(config)
    }

    /// Loads the global config, if present
    fn global() -> Result<Option<Self>> {
        let Some(dirs) = ProjectDirs::from("", "", "cadence") else {
            return Ok(None);
        };
        Self::read(&dirs.config_dir().join("config.toml"))
    }

    fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;

        let config = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(e.to_string()))
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        Ok(Some(config))
    }

    fn merge(&mut self, other: Config) {
        if other.default_manager.is_some() {
            self.default_manager = other.default_manager;
        }
        if other.default_assignee.is_some() {
            self.default_assignee = other.default_assignee;
        }
    }

    /// Writes the default config file if none exists; returns the path
    pub fn write_default(root: &Path) -> Result<PathBuf> {
        let path = root.join(".cadence").join("config.toml");
        if !path.exists() {
            let default_config = r#"# Cadence configuration

# Manager used when 'task add' omits --manager
# default_manager = "PM"

# Assignee used when 'task add' omits --assignee
# default_assignee = "DEV"
"#;
            fs::write(&path, default_config)
                .with_context(|| format!("Failed to write config: {}", path.display()))?;
        }
        Ok(path)
    }
}
