//! Writes vehicle export snapshots as JSON.
//!
//! Files land in the user-visible export directory as
//! `VehicleExport_<yyyy-MM-dd_HHmmss>.json`. Object keys are sorted, so two
//! exports of the same data differ only in `exportDate`.

use chrono::SecondsFormat;
use motorlog_core::backup::BACKUP_TIMESTAMP_FORMAT;
use motorlog_core::error::{MotorlogError, Result};
use motorlog_core::export::ExportSnapshot;
use motorlog_core::schema_version::SchemaVersion;
use motorlog_core::storage::{Clock, FileSystem};
use motorlog_core::vehicle::Vehicle;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const EXPORT_FILE_PREFIX: &str = "VehicleExport_";
pub const EXPORT_FILE_EXTENSION: &str = "json";

/// Builds and persists [`ExportSnapshot`]s.
pub struct ExportSerializer {
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    export_dir: PathBuf,
    schema_version: SchemaVersion,
    app_version: String,
}

impl ExportSerializer {
    /// `schema_version` is stamped into every snapshot.
    pub fn new(
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        export_dir: PathBuf,
        schema_version: SchemaVersion,
    ) -> Self {
        Self {
            fs,
            clock,
            export_dir,
            schema_version,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Denormalizes `vehicles` into a snapshot stamped with the schema and
    /// application versions.
    pub fn export_snapshot(&self, vehicles: &[Vehicle]) -> ExportSnapshot {
        ExportSnapshot {
            export_date: self
                .clock
                .now()
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            schema_version: self.schema_version.to_string(),
            app_version: self.app_version.clone(),
            vehicles: vehicles.iter().map(Into::into).collect(),
        }
    }

    /// Writes `snapshot` to a new file and returns its path.
    ///
    /// A failed write may leave a partial file behind.
    pub fn write_to_file(&self, snapshot: &ExportSnapshot) -> Result<PathBuf> {
        // Value objects are BTreeMap-backed: keys come out sorted.
        let value = serde_json::to_value(snapshot)?;
        let mut json = serde_json::to_string_pretty(&value)?;
        json.push('\n');

        self.fs.create_dir_all(&self.export_dir)?;
        let path = self.allocate_path();
        self.fs.write_file(&path, json.as_bytes())?;

        tracing::info!(
            "Exported {} vehicle(s) to {:?}",
            snapshot.vehicle_count(),
            path
        );
        Ok(path)
    }

    /// Parses an export written by [`Self::write_to_file`].
    pub fn read_snapshot(&self, path: &Path) -> Result<ExportSnapshot> {
        let bytes = self.fs.read_file(path)?;
        serde_json::from_slice(&bytes).map_err(|e| MotorlogError::Serialization {
            format: "JSON".to_string(),
            message: format!("{:?} is not a vehicle export: {}", path, e),
        })
    }

    fn allocate_path(&self) -> PathBuf {
        let stamp = self.clock.now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut collision = 0u32;
        loop {
            let file_name = if collision == 0 {
                format!("{EXPORT_FILE_PREFIX}{stamp}.{EXPORT_FILE_EXTENSION}")
            } else {
                format!("{EXPORT_FILE_PREFIX}{stamp}-{collision:02}.{EXPORT_FILE_EXTENSION}")
            };
            let path = self.export_dir.join(file_name);
            if !self.fs.exists(&path) {
                return path;
            }
            collision += 1;
        }
    }
}
