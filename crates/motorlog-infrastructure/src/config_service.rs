//! Configuration service implementation.
//!
//! Loads the root configuration from `~/.config/motorlog/config.toml`.

use crate::storage::AtomicTomlFile;
use motorlog_core::config::MotorlogConfig;
use motorlog_core::error::Result;
use std::path::PathBuf;

/// Loads [`MotorlogConfig`] from a TOML file.
pub struct ConfigService {
    file: AtomicTomlFile<MotorlogConfig>,
}

impl ConfigService {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicTomlFile::new(path),
        }
    }

    /// Reads the configuration. A missing or empty file yields the defaults.
    pub fn load(&self) -> Result<MotorlogConfig> {
        let config = self.file.load()?.unwrap_or_default();
        tracing::debug!("Loaded config from {:?}: {:?}", self.file.path(), config);
        Ok(config)
    }

    /// Reads the configuration, falling back to defaults on a broken file.
    pub fn load_or_default(&self) -> MotorlogConfig {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Failed to load config from {:?}, using defaults: {}",
                    self.file.path(),
                    e
                );
                MotorlogConfig::default()
            }
        }
    }
}
