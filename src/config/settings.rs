//! Tool settings, read from `~/.doksplan/config`
//!
//! A missing file means defaults. The API token itself never lives in this file;
//! `token_env` names the environment variable that holds it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::DEFAULT_API_URL;
use crate::resolver::ResolverDefaults;

pub const DEFAULT_TOKEN_ENV: &str = "DIGITALOCEAN_TOKEN";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Default settings file location: ~/.doksplan/config
pub fn default_settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".doksplan")
        .join("config")
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to parse settings: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// DigitalOcean API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the API token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Upper bound on the version lookup
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Version prefix used when a configuration pins neither version nor prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_prefix: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_env: default_token_env(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            version_prefix: None,
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_token_env() -> String {
    DEFAULT_TOKEN_ENV.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Token from the configured environment variable, if set and non-empty
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }

    /// Resolver defaults with this file's overrides applied
    pub fn resolver_defaults(&self) -> ResolverDefaults {
        let mut defaults = ResolverDefaults::default();
        if let Some(prefix) = &self.version_prefix {
            defaults.version_prefix = prefix.clone();
        }
        defaults
    }
}

// ============================================================================
// SBIO: Pure business logic (no I/O)
// ============================================================================

/// Parse settings from a YAML string; an empty document yields defaults
pub fn parse_settings(content: &str) -> Result<Settings, SettingsError> {
    if content.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(content).map_err(|e| SettingsError::ParseError(e.to_string()))
}

// ============================================================================
// I/O boundary functions
// ============================================================================

/// Load settings from the default location
pub fn load_settings() -> Result<Settings, SettingsError> {
    load_settings_from(&default_settings_path())
}

/// Load settings from a specific path
pub fn load_settings_from(path: &Path) -> Result<Settings, SettingsError> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    parse_settings(&content)
}
