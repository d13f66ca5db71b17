//! Configuration management for capiview
//!
//! One config for every view: backend URL, theme, canvas defaults and
//! refresh behaviour are set once and apply everywhere.
//!
//! Config file location: ~/.config/capiview/config.toml

use crate::refresh::INTERVAL_CHOICES;
use crate::tree::LayoutConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Choices offered for the log line limit
pub const LOG_LINE_CHOICES: &[u32] = &[100, 500, 1000, 5000, 10000];

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_url: String,
    pub theme: ThemeName,
    pub straight_links: bool,
    pub show_lens: bool,
    pub refresh_interval: String,
    pub max_log_lines: u32,
    pub tree: LayoutConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8081".to_string(),
            theme: ThemeName::Dark,
            straight_links: false,
            show_lens: true,
            refresh_interval: "1m".to_string(),
            max_log_lines: 1000,
            tree: LayoutConfig::default(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("capiview");
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from file, or create default if not exists
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config to {:?}", path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Step the refresh interval through the offered choices
    pub fn next_refresh_interval(&self) -> String {
        let idx = INTERVAL_CHOICES
            .iter()
            .position(|c| c.eq_ignore_ascii_case(&self.refresh_interval));
        let next = match idx {
            Some(i) => INTERVAL_CHOICES[(i + 1) % INTERVAL_CHOICES.len()],
            None => INTERVAL_CHOICES[0],
        };
        next.to_string()
    }

    /// Step the log line limit through the offered choices
    pub fn next_max_log_lines(&self) -> u32 {
        match LOG_LINE_CHOICES.iter().position(|&n| n == self.max_log_lines) {
            Some(i) => LOG_LINE_CHOICES[(i + 1) % LOG_LINE_CHOICES.len()],
            None => LOG_LINE_CHOICES[0],
        }
    }
}

/// Available theme names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    #[default]
    Dark,
    Light,
    Transparent,
}

impl ThemeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Dark => "Dark",
            ThemeName::Light => "Light",
            ThemeName::Transparent => "Transparent",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ThemeName::Dark => ThemeName::Light,
            ThemeName::Light => ThemeName::Transparent,
            ThemeName::Transparent => ThemeName::Dark,
        }
    }
}
