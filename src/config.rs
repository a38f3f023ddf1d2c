use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_GREETING: &str = "Hi, I'm here to help. What can I do for you today?";
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Unable to send message";
pub const ENDPOINT_ENV_VAR: &str = "DIALOQ_ENDPOINT";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bot chat endpoint, e.g. `https://host/api/v1/bot/<id>`
    pub endpoint: Option<String>,

    /// Shown in the header in place of a brand name
    pub bot_title: String,

    /// First bot message of every session
    pub greeting: String,

    /// Bot message shown when a send fails
    pub fallback_message: String,

    /// Whole-request timeout; no timeout when unset
    pub request_timeout_secs: Option<u64>,

    /// Where `dialoq.log` is written
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: None,
            bot_title: "⚡".to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
            request_timeout_secs: None,
            log_dir: dialoq_home().join("log"),
        }
    }
}

/// `~/.dialoq`, falling back to the working directory
pub fn dialoq_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".dialoq")
}

impl Config {
    /// Load `~/.dialoq/config.toml` (or `path`), then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => dialoq_home().join("config.toml"),
        };

        let mut config = if config_path.exists() {
            Self::from_file(&config_path)?
        } else {
            Config::default()
        };

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV_VAR) {
            if !endpoint.trim().is_empty() {
                config.endpoint = Some(endpoint);
            }
        }

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Effective configuration as TOML, in the same shape the file uses
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Override the endpoint, e.g. from the command line
    pub fn with_endpoint(mut self, endpoint: Option<String>) -> Self {
        if endpoint.is_some() {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn endpoint_url(&self) -> Result<Url> {
        let raw = self.endpoint.as_deref().with_context(|| {
            format!("No endpoint configured. Pass --endpoint or set {ENDPOINT_ENV_VAR}.")
        })?;
        Url::parse(raw).with_context(|| format!("Invalid endpoint URL: {raw}"))
    }
}
