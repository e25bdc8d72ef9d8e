//! Path management for Tailor's configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/tailor/            # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/tailor/       # Data directory
//! ├── sessions/                # One JSON document per session
//! ├── tailor_history           # Append-only history log
//! └── logs/                    # Shell logs
//!     └── tailor.log.YYYY-MM-DD
//! ```
//!
//! Setting `TAILOR_HOME` puts everything under that one directory instead.

use std::path::{Path, PathBuf};

use tailor_core::config::TailorConfig;
use tailor_core::{Result, TailorError};

pub const HOME_ENV: &str = "TAILOR_HOME";
const APP_DIR: &str = "tailor";

/// Resolved locations of every file Tailor reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TailorPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl TailorPaths {
    /// Resolves from `TAILOR_HOME`, falling back to the platform directories.
    pub fn resolve() -> Result<Self> {
        match std::env::var_os(HOME_ENV) {
            Some(home) if !home.is_empty() => Ok(Self::from_home(PathBuf::from(home))),
            _ => Self::platform(),
        }
    }

    /// Uses the platform config and data directories (XDG on Linux).
    pub fn platform() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| TailorError::config("Cannot find the config directory"))?;
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TailorError::config("Cannot find the data directory"))?;
        Ok(Self {
            config_dir: config_dir.join(APP_DIR),
            data_dir: data_dir.join(APP_DIR),
        })
    }

    /// Everything under one root directory.
    pub fn from_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            config_dir: home.clone(),
            data_dir: home,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn default_sessions_dir(&self) -> PathBuf {
        self.data_dir.join("sessions")
    }

    pub fn default_history_file(&self) -> PathBuf {
        self.data_dir.join("tailor_history")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// The sessions directory, honouring `[storage] sessions_dir`.
    pub fn sessions_dir(&self, config: &TailorConfig) -> PathBuf {
        config
            .storage
            .sessions_dir
            .clone()
            .unwrap_or_else(|| self.default_sessions_dir())
    }

    /// The history log, honouring `[storage] history_file`.
    pub fn history_file(&self, config: &TailorConfig) -> PathBuf {
        config
            .storage
            .history_file
            .clone()
            .unwrap_or_else(|| self.default_history_file())
    }
}
