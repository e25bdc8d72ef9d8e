//! Configuration service implementation.
//!
//! Loads [`TailorConfig`] from `config.toml`. A missing file means defaults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tailor_core::config::TailorConfig;
use tailor_core::{Result, TailorError};

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(TailorConfig)`: parsed file, or defaults when the file is absent
    /// - `Err(TailorError::Config)`: the file is not valid TOML for the schema
    pub fn load(&self) -> Result<TailorConfig> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("[Config] No config at {:?}, using defaults", self.path);
                return Ok(TailorConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|e| {
            TailorError::config(format!("Invalid config {}: {}", self.path.display(), e))
        })
    }

    /// Writes the default configuration. Refuses to overwrite unless `force`.
    pub fn write_default(&self, force: bool) -> Result<()> {
        if self.path.exists() && !force {
            return Err(TailorError::validation(format!(
                "Config file {} already exists.",
                self.path.display()
            )));
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let text = toml::to_string_pretty(&TailorConfig::default())?;
        fs::write(&self.path, text)?;
        tracing::info!("[Config] Wrote default config to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("config.toml"));
        assert_eq!(service.load().unwrap(), TailorConfig::default());
    }

    #[test]
    fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[session]\nauto_save = true\nauto_save_min_commands = 2\n").unwrap();

        let config = ConfigService::new(&path).load().unwrap();
        assert!(config.session.auto_save);
        assert_eq!(config.session.auto_save_min_commands, 2);
        assert_eq!(config.session.auto_save_interval, 300);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[session\nauto_save = ").unwrap();

        assert!(ConfigService::new(&path).load().unwrap_err().is_config());
    }

    #[test]
    fn test_write_default() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::new(temp_dir.path().join("nested/config.toml"));

        service.write_default(false).unwrap();
        assert_eq!(service.load().unwrap(), TailorConfig::default());

        assert!(service.write_default(false).unwrap_err().is_validation());
        service.write_default(true).unwrap();
    }
}
