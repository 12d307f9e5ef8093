//! Unified path management for Motorlog files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/motorlog/                 # Config directory
//! └── config.toml                     # Application configuration
//!
//! ~/.local/share/motorlog/            # App data root
//! ├── Motorlog.sqlite                 # Persistent store (+ -wal / -shm sidecars)
//! ├── version_state.toml              # Recorded schema version
//! └── Backups/
//!     └── backup_<yyyy-MM-dd_HHmmss>/ # Verbatim copies of the store files
//!
//! ~/Documents/                        # User-visible export location
//! └── VehicleExport_<yyyy-MM-dd_HHmmss>.json
//! ```

use std::path::{Path, PathBuf};

const APP_DIR_NAME: &str = "motorlog";
const BACKUPS_DIR_NAME: &str = "Backups";
const VERSION_STATE_FILE_NAME: &str = "version_state.toml";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// A platform directory could not be determined.
    DirNotFound(&'static str),
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::DirNotFound(kind) => write!(f, "Cannot find {} directory", kind),
        }
    }
}

impl std::error::Error for PathError {}

/// Resolved locations of every Motorlog file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotorlogPaths {
    data_root: PathBuf,
    export_dir: PathBuf,
    config_dir: PathBuf,
}

impl MotorlogPaths {
    /// Resolves platform directories, honouring overrides.
    pub fn resolve(
        data_dir_override: Option<&Path>,
        export_dir_override: Option<&Path>,
    ) -> Result<Self, PathError> {
        let data_root = match data_dir_override {
            Some(dir) => dir.to_path_buf(),
            None => dirs::data_dir()
                .ok_or(PathError::DirNotFound("data"))?
                .join(APP_DIR_NAME),
        };

        let export_dir = match export_dir_override {
            Some(dir) => dir.to_path_buf(),
            None => dirs::document_dir()
                .or_else(dirs::home_dir)
                .ok_or(PathError::DirNotFound("documents"))?,
        };

        Ok(Self {
            data_root,
            export_dir,
            config_dir: Self::default_config_dir()?,
        })
    }

    /// Every location under one root, for tests and portable installs.
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            data_root: root.join("data"),
            export_dir: root.join("exports"),
            config_dir: root.join("config"),
        }
    }

    pub fn default_config_dir() -> Result<PathBuf, PathError> {
        Ok(dirs::config_dir()
            .ok_or(PathError::DirNotFound("config"))?
            .join(APP_DIR_NAME))
    }

    pub fn default_config_file() -> Result<PathBuf, PathError> {
        Ok(Self::default_config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Directory holding the persistent store files.
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.data_root.join(BACKUPS_DIR_NAME)
    }

    pub fn version_state_file(&self) -> PathBuf {
        self.data_root.join(VERSION_STATE_FILE_NAME)
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}
