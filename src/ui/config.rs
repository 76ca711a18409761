//! # Configuration Persistence
//!
//! Manages user configuration stored in `~/.config/flashdeck/config.json`.
//!
//! ## Settings
//!
//! | Key | Default | Meaning |
//! |-----|---------|---------|
//! | `theme` | `"Catppuccin Mocha"` | built-in theme name |
//! | `search_debounce_ms` | `300` | quiet period before a typed search runs |
//! | `state_file` | XDG data dir | where decks are saved |
//!
//! The `directories` crate is used to resolve the platform-appropriate config
//! directory.

use crate::deck::search::DEFAULT_DEBOUNCE;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// The name of the selected theme (must match a built-in theme name).
    #[serde(default = "default_theme_name")]
    pub theme: String,

    #[serde(default = "default_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Override for the saved-state file location.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

fn default_theme_name() -> String {
    "Catppuccin Mocha".to_string()
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme_name(),
            search_debounce_ms: default_debounce_ms(),
            state_file: None,
        }
    }
}

impl Config {
    /// Load configuration from disk. Returns `Config::default()` if the file
    /// does not exist or cannot be parsed.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_default()
    }

    fn try_load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path. Returns `Config::default()` if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Return the path to the config file.
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "flashdeck")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }
}
