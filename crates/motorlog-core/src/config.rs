//! Application configuration.
//!
//! Loaded from `~/.config/motorlog/config.toml`. Every key is optional; a
//! missing file or section yields the defaults below.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of backups kept after pruning.
pub const DEFAULT_RETENTION_COUNT: usize = 3;

/// Free space required before a backup is attempted (100 MiB).
pub const DEFAULT_MINIMUM_FREE_BYTES: u64 = 104_857_600;

/// Primary file name of the persistent store.
pub const DEFAULT_STORE_FILE_NAME: &str = "Motorlog.sqlite";

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotorlogConfig {
    pub backup: BackupConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    pub retention_count: usize,
    pub minimum_free_bytes: u64,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            retention_count: DEFAULT_RETENTION_COUNT,
            minimum_free_bytes: DEFAULT_MINIMUM_FREE_BYTES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub store_file_name: String,
    /// Overrides the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    /// Overrides the documents directory used for exports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            store_file_name: DEFAULT_STORE_FILE_NAME.to_string(),
            data_dir: None,
            export_dir: None,
        }
    }
}

impl MotorlogConfig {
    /// Retention is at least one backup.
    pub fn retention_count(&self) -> usize {
        self.backup.retention_count.max(1)
    }
}
