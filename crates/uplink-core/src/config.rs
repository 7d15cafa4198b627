//! Configuration management for uplink.
//!
//! Loads configuration from ${UPLINK_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Server connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the status server.
    pub base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: Config::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Authentication defaults. Only the username is ever stored; the key is
/// supplied per invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Default username for `watch` when no flag is given.
    pub username: Option<String>,
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server connection settings.
    pub server: ServerConfig,

    /// Authentication defaults.
    pub auth: AuthConfig,
}

impl Config {
    const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the server base URL with precedence:
    /// `UPLINK_BASE_URL` env > CLI flag > config > default.
    ///
    /// # Errors
    /// Returns an error when the winning value is not a well-formed URL.
    pub fn resolve_base_url(&self, flag: Option<&str>) -> Result<String> {
        if let Ok(env_url) = std::env::var("UPLINK_BASE_URL") {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        if let Some(flag_url) = flag {
            let trimmed = flag_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        let configured = self.server.base_url.trim();
        if !configured.is_empty() {
            validate_url(configured)?;
            return Ok(configured.trim_end_matches('/').to_string());
        }

        Ok(Self::DEFAULT_BASE_URL.to_string())
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid server base URL: {url}"))?;
    Ok(())
}

pub mod paths {
    //! Path resolution for uplink configuration.
    //!
    //! UPLINK_HOME resolution order:
    //! 1. UPLINK_HOME environment variable (if set)
    //! 2. ~/.config/uplink (default)

    use std::path::PathBuf;

    /// Returns the uplink home directory.
    pub fn uplink_home() -> PathBuf {
        if let Ok(home) = std::env::var("UPLINK_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("uplink"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        uplink_home().join("config.toml")
    }
}
