//! Configuration for the `earth` command.
//!
//! The configuration file is TOML, found at `--config` when given and at
//! `$CONFIG/libearth/config.toml` otherwise. A missing file yields the
//! defaults. `EARTH_REPOSITORY` and `EARTH_CHUNK_SIZE` override the file.

use libearth_core::{Error, Result};
use libearth_repository::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`EarthConfig::repository_url`].
pub const ENV_REPOSITORY: &str = "EARTH_REPOSITORY";

/// Environment variable overriding [`EarthConfig::chunk_size`].
pub const ENV_CHUNK_SIZE: &str = "EARTH_CHUNK_SIZE";

/// Settings of the `earth` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EarthConfig {
    /// Repository used when a `repo` command gets no `--url`.
    pub repository_url: Option<String>,
    /// Buffer size for reading documents.
    pub chunk_size: usize,
    /// Log filter used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for EarthConfig {
    fn default() -> Self {
        Self {
            repository_url: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            log_level: "warn".to_string(),
        }
    }
}

impl EarthConfig {
    /// Default location of the configuration file.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("libearth").join("config.toml"))
    }

    /// The explicit path when given, the default location otherwise.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        explicit.map(PathBuf::from).or_else(Self::default_config_path)
    }

    /// Loads the configuration and applies environment overrides.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the file or an override cannot be parsed.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if explicit.is_some() => {
                return Err(Error::config(format!(
                    "Config file does not exist at {}",
                    path.display()
                )));
            }
            _ => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Reads a configuration file without overrides.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the file cannot be read or parsed, or sets a
    /// zero `chunk_size`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        if config.chunk_size == 0 {
            return Err(Error::config(format!(
                "chunk_size in {} must be a positive integer",
                path.display()
            )));
        }
        Ok(config)
    }

    /// Applies overrides found through `lookup`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when `EARTH_CHUNK_SIZE` is not a positive integer.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_REPOSITORY) {
            self.repository_url = Some(url);
        }
        if let Some(size) = lookup(ENV_CHUNK_SIZE) {
            self.chunk_size = match size.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(Error::config(format!(
                        "{ENV_CHUNK_SIZE} must be a positive integer, not {size:?}"
                    )));
                }
            };
        }
        Ok(())
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] on serialization failure.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }
}
