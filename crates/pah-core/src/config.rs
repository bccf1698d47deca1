//! Configuration loaded from `$PAH_HOME/config.toml`.
//!
//! `PAH_HOME` defaults to `~/.pah`. Every field has a default, so a
//! missing file yields a working local configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Base URL of the hub backend.
    pub hub_url: String,
    pub chat_path: String,
    pub events_path: String,
    pub callback_path: String,
    /// Delay between push reconnect attempts, in milliseconds.
    pub reconnect_delay_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            hub_url: "http://127.0.0.1:8000".into(),
            chat_path: "/api/v1/agent/chat".into(),
            events_path: "/api/v1/agent/events".into(),
            callback_path: "/api/v1/agent/callback".into(),
            reconnect_delay_ms: 3000,
        }
    }
}

impl HubConfig {
    /// Loads `$PAH_HOME/config.toml`, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path()?)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn chat_url(&self) -> Result<Url> {
        self.endpoint(&self.chat_path)
    }

    pub fn events_url(&self) -> Result<Url> {
        self.endpoint(&self.events_path)
    }

    pub fn callback_url(&self) -> Result<Url> {
        self.endpoint(&self.callback_path)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base: Url = self
            .hub_url
            .parse()
            .with_context(|| format!("invalid hub_url: {}", self.hub_url))?;
        base.join(path)
            .with_context(|| format!("invalid endpoint path: {path}"))
    }
}

pub mod paths {
    use super::{Context, PathBuf, Result};

    /// Root for config, state, and logs: `$PAH_HOME` or `~/.pah`.
    pub fn pah_home() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("PAH_HOME") {
            if !home.is_empty() {
                return Ok(PathBuf::from(home));
            }
        }
        let home = std::env::var("HOME").context("HOME is not set")?;
        Ok(PathBuf::from(home).join(".pah"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(pah_home()?.join("config.toml"))
    }

    pub fn state_path() -> Result<PathBuf> {
        Ok(pah_home()?.join("state.json"))
    }

    pub fn log_dir() -> Result<PathBuf> {
        Ok(pah_home()?.join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = HubConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.hub_url, "http://127.0.0.1:8000");
        assert_eq!(config.reconnect_delay(), Duration::from_millis(3000));
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "hub_url = \"https://hub.example.com\"\n").unwrap();
        let config = HubConfig::load_from(&path).unwrap();
        assert_eq!(config.hub_url, "https://hub.example.com");
        assert_eq!(config.chat_path, "/api/v1/agent/chat");
    }

    #[test]
    fn endpoints_join_onto_the_base_url() {
        let config = HubConfig {
            hub_url: "https://hub.example.com".into(),
            ..HubConfig::default()
        };
        assert_eq!(
            config.events_url().unwrap().as_str(),
            "https://hub.example.com/api/v1/agent/events"
        );
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let config = HubConfig {
            hub_url: "not a url".into(),
            ..HubConfig::default()
        };
        assert!(config.chat_url().is_err());
    }
}
