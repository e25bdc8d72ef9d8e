pub mod config;
pub mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tailor_core::config::TailorConfig;
use tailor_infrastructure::{ConfigService, TailorPaths};

/// Resolved directories plus the loaded configuration.
pub struct Environment {
    pub paths: TailorPaths,
    pub config_service: ConfigService,
}

impl Environment {
    pub fn resolve(config: Option<PathBuf>) -> Result<Self> {
        let paths = TailorPaths::resolve().context("Failed to resolve Tailor directories")?;
        let config_service = ConfigService::new(config.unwrap_or_else(|| paths.config_file()));
        Ok(Self {
            paths,
            config_service,
        })
    }

    pub fn load_config(&self) -> Result<TailorConfig> {
        self.config_service
            .load()
            .with_context(|| format!("Failed to load {}", self.config_service.path().display()))
    }
}
