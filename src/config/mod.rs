//! Application Configuration
//!
//! User settings stored in TOML format in the platform config directory.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Camera settings
    pub capture: CaptureSettings,
    /// Reading schedule and inference settings
    pub reader: ReaderSettings,
    /// History retention settings
    pub history: HistorySettings,
    /// On-disk log settings
    pub log: LogSettings,
}

/// Camera-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Camera device index
    pub camera_index: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self { camera_index: 0 }
    }
}

/// Reading schedule and remote inference settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderSettings {
    /// Seconds between automatic readings
    pub interval_secs: u64,
    /// Base URL of the chat-completions endpoint
    pub api_base: String,
    /// Model name sent with each request
    pub model: String,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-5".to_string(),
        }
    }
}

/// History retention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Maximum retained readings; 0 keeps everything
    pub max_entries: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_entries: 60 }
    }
}

impl HistorySettings {
    /// Retention cap as an option (`None` = unbounded)
    pub fn cap(&self) -> Option<usize> {
        if self.max_entries == 0 {
            None
        } else {
            Some(self.max_entries)
        }
    }
}

/// On-disk log settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Directory for per-run CSV files; empty uses the platform data dir
    pub data_dir: Option<String>,
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
