use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root of `config.toml`. Every field has a default, so an empty file is valid.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TailorConfig {
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub history: HistoryConfig,
    pub logging: LoggingConfig,
}

impl TailorConfig {
    pub fn auto_save(&self) -> AutoSaveConfig {
        AutoSaveConfig {
            enabled: self.session.auto_save,
            interval_seconds: self.session.auto_save_interval,
            min_commands: self.session.auto_save_min_commands,
        }
    }
}

/// Locations that override the platform defaults.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    pub auto_save: bool,
    pub auto_save_interval: u64,
    pub auto_save_min_commands: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_save: false,
            auto_save_interval: 300,
            auto_save_min_commands: 5,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Size of the line editor's in-memory history.
    pub limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: 1000 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Auto-save policy as the controller consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub min_commands: usize,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        TailorConfig::default().auto_save()
    }
}
