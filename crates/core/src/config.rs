//! Application configuration handling.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Base URL used when no configuration file or override is present.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";

const DEFAULT_PER_PAGE: u32 = 6;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings for the client, loaded from the config file with
/// `AVENTURA_*` environment overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the backend API.
    pub api_base_url: String,
    /// Page size used by list operations when the caller passes none.
    pub default_per_page: u32,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_per_page: DEFAULT_PER_PAGE,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AppConfig {
    /// Directory holding the config file and the persisted credential.
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("aventura")
    }

    /// Default path of the configuration file.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load settings from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load settings from an explicit file path.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut builder = Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("default_per_page", i64::from(DEFAULT_PER_PAGE))?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?;
        if path.exists() {
            builder = builder.add_source(File::from(path.to_path_buf()));
        }
        let settings = builder
            .add_source(Environment::with_prefix("AVENTURA"))
            .build()
            .context("failed to assemble configuration")?;
        settings
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

/// Write a default configuration file if none exists yet, returning its
/// path.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = AppConfig::config_path();
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let contents = format!(
        "api_base_url = \"{DEFAULT_API_BASE_URL}\"\ndefault_per_page = {DEFAULT_PER_PAGE}\nrequest_timeout_secs = {DEFAULT_TIMEOUT_SECS}\n"
    );
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
