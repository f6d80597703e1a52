//! Configuration management for Praxis CLI
//!
//! Stores the API URL, access token and display settings in
//! ~/.config/praxis/config.toml. `PRAXIS_API_URL` and `PRAXIS_ACCESS_TOKEN`
//! (environment or `.env`) take precedence over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use praxis::StreamOptions;
use praxis_client::ClientConfig;

const CONFIG_DIR: &str = "praxis";
const CONFIG_FILE: &str = "config.toml";

pub const ENV_API_URL: &str = "PRAXIS_API_URL";
pub const ENV_ACCESS_TOKEN: &str = "PRAXIS_ACCESS_TOKEN";

/// CLI Configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Delay between typed characters
    #[serde(default = "default_reveal_speed_ms")]
    pub reveal_speed_ms: u64,
    #[serde(default = "default_typewriter")]
    pub typewriter: bool,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_reveal_speed_ms() -> u64 {
    15
}

fn default_typewriter() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            access_token: None,
            reveal_speed_ms: default_reveal_speed_ms(),
            typewriter: default_typewriter(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join(CONFIG_DIR);
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// File config with environment overrides applied. Not meant to be saved.
    pub fn resolve() -> Result<Self> {
        let config = Self::load()?;
        Ok(config.with_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_ACCESS_TOKEN).ok(),
        ))
    }

    pub fn with_overrides(mut self, base_url: Option<String>, access_token: Option<String>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = access_token.filter(|t| !t.trim().is_empty()) {
            self.access_token = Some(token);
        }
        self
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {:?}", dir))?;

        let path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        Ok(())
    }

    /// Set access token
    pub fn set_access_token(&mut self, token: String) {
        self.access_token = Some(token);
    }

    pub fn stream_options(&self) -> StreamOptions {
        StreamOptions::default()
            .with_reveal_speed(Duration::from_millis(self.reveal_speed_ms))
            .with_typewriter(self.typewriter)
    }

    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::new(&self.base_url).with_stream_options(self.stream_options());
        match &self.access_token {
            Some(token) => config.with_access_token(token),
            None => config,
        }
    }
}
