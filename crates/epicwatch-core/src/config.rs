//! Configuration management for epicwatch.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS/Linux**: `~/.config/epicwatch/config.toml`
//! - **Windows**: `%APPDATA%\epicwatch\config.toml`
//!
//! Tokens are never written here; see `epicwatch-storage`.
//!
//! # Example
//!
//! ```ignore
//! use epicwatch_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("epic.min_body_len", "60")?;
//! config.save()?;
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "epicwatch";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// GitHub configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubConfig>,

    /// EPIC template configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epic: Option<EpicConfig>,
}

/// GitHub provider configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API base URL (for GitHub Enterprise)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Web URL used for issue links in reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
}

/// EPIC update template configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EpicConfig {
    /// Minimum trimmed body length for a comment to count as an update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_body_len: Option<usize>,
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default (empty) config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// GitHub API base URL override, if any.
    pub fn github_base_url(&self) -> Option<&str> {
        self.github.as_ref().and_then(|g| g.base_url.as_deref())
    }

    /// GitHub web URL override, if any.
    pub fn github_web_url(&self) -> Option<&str> {
        self.github.as_ref().and_then(|g| g.web_url.as_deref())
    }

    /// Minimum body length override for the template matcher, if any.
    pub fn min_body_len(&self) -> Option<usize> {
        self.epic.as_ref().and_then(|e| e.min_body_len)
    }

    /// Set a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `github.base_url`, `epic.min_body_len`)
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field) = split_key(key)?;

        match section {
            "github" => {
                let config = self.github.get_or_insert_with(GitHubConfig::default);
                match field {
                    "base_url" | "url" => config.base_url = Some(value.to_string()),
                    "web_url" => config.web_url = Some(value.to_string()),
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown GitHub config field: {}",
                            field
                        )))
                    }
                }
            }
            "epic" => {
                let config = self.epic.get_or_insert_with(EpicConfig::default);
                match field {
                    "min_body_len" => {
                        let len = value.parse::<usize>().map_err(|_| {
                            Error::Config(format!(
                                "Invalid value for epic.min_body_len: '{}'",
                                value
                            ))
                        })?;
                        config.min_body_len = Some(len);
                    }
                    _ => {
                        return Err(Error::Config(format!(
                            "Unknown EPIC config field: {}",
                            field
                        )))
                    }
                }
            }
            _ => {
                return Err(Error::Config(format!("Unknown section: {}", section)));
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Key format: `section.field` (e.g., `github.base_url`, `epic.min_body_len`)
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field) = split_key(key)?;

        match section {
            "github" => {
                let Some(config) = &self.github else {
                    return Ok(None);
                };
                match field {
                    "base_url" | "url" => Ok(config.base_url.clone()),
                    "web_url" => Ok(config.web_url.clone()),
                    _ => Err(Error::Config(format!(
                        "Unknown GitHub config field: {}",
                        field
                    ))),
                }
            }
            "epic" => {
                let Some(config) = &self.epic else {
                    return Ok(None);
                };
                match field {
                    "min_body_len" => Ok(config.min_body_len.map(|n| n.to_string())),
                    _ => Err(Error::Config(format!(
                        "Unknown EPIC config field: {}",
                        field
                    ))),
                }
            }
            _ => Err(Error::Config(format!("Unknown section: {}", section))),
        }
    }
}

fn split_key(key: &str) -> Result<(&str, &str)> {
    let parts: Vec<&str> = key.split('.').collect();
    if parts.len() != 2 {
        return Err(Error::Config(format!(
            "Invalid config key '{}'. Expected format: section.field",
            key
        )));
    }
    Ok((parts[0], parts[1]))
}

// =============================================================================
// Tests
// =============================================================================
