//! Crate configuration management.
//!
//! This module handles loading and saving the configuration the session
//! core needs: the backend base URL, the project api key, and the last
//! signed-in user for restore-on-start.
//!
//! Configuration is stored at `~/.config/shiftgate/config.json`; the URL
//! and api key can also come from `SHIFTGATE_URL` / `SHIFTGATE_API_KEY`
//! environment variables (a `.env` file is honored).

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths and as the
/// keychain service name.
pub(crate) const APP_NAME: &str = "shiftgate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub last_user_id: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Build a config from environment variables alone.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Environment overrides file contents so deployments can repoint
    /// the backend without touching user state.
    fn apply_env(&mut self) {
        let _ = dotenvy::dotenv();
        if let Ok(url) = std::env::var("SHIFTGATE_URL") {
            self.base_url = url;
        }
        if let Ok(key) = std::env::var("SHIFTGATE_API_KEY") {
            self.api_key = key;
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session snapshot.
    pub fn snapshot_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
