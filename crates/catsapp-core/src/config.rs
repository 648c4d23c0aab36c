//! Application configuration management.
//!
//! This module handles loading the client configuration: the
//! backend URL, request timeout and retry settings.
//!
//! Configuration is stored at `~/.config/catsapp/config.json`. Values from
//! `CATSAPP_*` environment variables override the file.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::RetryPolicy;

/// Application name used for config/data directory paths
const APP_NAME: &str = "catsapp";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Session storage file name in the data directory
const STORAGE_FILE: &str = "storage.json";

const DEFAULT_API_URL: &str = "https://xpert-group-cat-backend.vercel.app/api";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Upper bound on extra attempts, whatever the file or environment says
const MAX_RETRY_ATTEMPTS: u32 = 10;

pub const ENV_API_URL: &str = "CATSAPP_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "CATSAPP_TIMEOUT_SECS";
pub const ENV_RETRY_ATTEMPTS: &str = "CATSAPP_RETRY_ATTEMPTS";
pub const ENV_RETRY_DELAY_MS: &str = "CATSAPP_RETRY_DELAY_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub timeout_secs: u64,
    /// Extra attempts for idempotent requests that hit a transient failure.
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

impl Config {
    /// Load the config file (defaults if absent) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from `lookup`, ignoring values that do not parse.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
        if let Some(secs) = parse_override(&lookup, ENV_TIMEOUT_SECS) {
            self.timeout_secs = secs;
        }
        if let Some(attempts) = parse_override(&lookup, ENV_RETRY_ATTEMPTS) {
            self.retry_attempts = attempts;
        }
        if let Some(delay) = parse_override(&lookup, ENV_RETRY_DELAY_MS) {
            self.retry_delay_ms = delay;
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts.min(MAX_RETRY_ATTEMPTS),
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where the session storage file lives.
    pub fn storage_path(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME).join(STORAGE_FILE))
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable configuration override");
            None
        }
    }
}
