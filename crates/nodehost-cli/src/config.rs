//! Configuration file handling for nodehost-cli

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Default API base URL
    pub server: Option<String>,
    /// Shared signing secret
    pub secret: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("nodehost-cli");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(
        &self,
        server: Option<&str>,
        secret: Option<&str>,
        no_color: bool,
    ) -> MergedConfig {
        MergedConfig {
            server: server
                .map(String::from)
                .or_else(|| self.server.clone())
                .unwrap_or_else(|| "http://localhost:5000".to_string()),
            secret: secret.map(String::from).or_else(|| self.secret.clone()),
            no_color: no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub server: String,
    pub secret: Option<String>,
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_file_values() {
        let config = Config {
            server: Some("http://file:5000".to_string()),
            secret: Some("file-secret".to_string()),
            no_color: Some(false),
        };

        let merged = config.merge_with_args(Some("http://arg:5000"), None, true);
        assert_eq!(merged.server, "http://arg:5000");
        assert_eq!(merged.secret.as_deref(), Some("file-secret"));
        assert!(merged.no_color);
    }

    #[test]
    fn test_defaults_when_nothing_configured() {
        let merged = Config::default().merge_with_args(None, None, false);
        assert_eq!(merged.server, "http://localhost:5000");
        assert_eq!(merged.secret, None);
    }
}
