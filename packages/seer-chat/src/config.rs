//! Client configuration loaded from `config.toml`.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use seer_core::Role;

use crate::api::DEFAULT_ENDPOINT;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "SEER_CHAT_CONFIG";

/// Environment variable checked for the API key when none is configured.
pub const DEFAULT_API_KEY_ENV: &str = "SEER_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shared document file; `None` uses the store's default path
    pub document_path: Option<PathBuf>,
    pub display_name: String,
    pub role: Role,
    pub poll_interval_ms: u64,
    /// Whether the chat panel starts open
    pub panel_open: bool,
    pub oracle: OracleConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            document_path: None,
            display_name: "Wanderer".to_string(),
            role: Role::Player,
            poll_interval_ms: 500,
            panel_open: true,
            oracle: OracleConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Environment variable read when `api_key` is unset
    pub api_key_env: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

impl Config {
    /// Get the default config path.
    ///
    /// `SEER_CHAT_CONFIG` if set, otherwise `config.toml` in the platform
    /// config directory.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }

        directories::ProjectDirs::from("dev", "seer", "seer-chat")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load from `path`. A missing file gives defaults; a broken one is
    /// logged and also gives defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::parse(&raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Could not read config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// Configured API key, falling back to the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.oracle
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| env::var(&self.oracle.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }
}
