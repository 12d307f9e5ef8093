//! Builds the service graph from configuration and platform paths.

use anyhow::{Context, Result};
use motorlog_core::config::MotorlogConfig;
use motorlog_core::migration::SchemaMigrator;
use motorlog_core::storage::{Clock, FileSystem, SystemClock};
use motorlog_core::vehicle::VehicleSource;
use motorlog_core::version::VersionStateStore;
use motorlog_infrastructure::{
    ArchiverSettings, BackupArchiver, ConfigService, ExportSerializer, LocalFileSystem,
    MotorlogPaths, TomlKeyValueStore,
};
use std::path::Path;
use std::sync::Arc;

use crate::migration_coordinator::MigrationCoordinator;

/// Explicitly constructed services, shared through `Arc`s.
pub struct MotorlogServices {
    pub paths: MotorlogPaths,
    pub config: MotorlogConfig,
    pub version_state: Arc<VersionStateStore>,
    pub archiver: Arc<BackupArchiver>,
    pub exporter: Arc<ExportSerializer>,
}

impl MotorlogServices {
    /// Loads `config.toml` from the platform config directory and resolves
    /// paths. `data_dir` takes precedence over `storage.data_dir`.
    pub fn load(data_dir: Option<&Path>) -> Result<Self> {
        let config_file =
            MotorlogPaths::default_config_file().context("Failed to locate config directory")?;
        let config = ConfigService::new(config_file).load_or_default();

        let data_dir = data_dir.or(config.storage.data_dir.as_deref());
        let paths = MotorlogPaths::resolve(data_dir, config.storage.export_dir.as_deref())
            .context("Failed to resolve data directories")?;

        Ok(Self::from_parts(paths, config))
    }

    /// Wires services over the local disk and the wall clock.
    pub fn from_parts(paths: MotorlogPaths, config: MotorlogConfig) -> Self {
        Self::with_capabilities(
            paths,
            config,
            Arc::new(LocalFileSystem::new()),
            Arc::new(SystemClock),
        )
    }

    pub fn with_capabilities(
        paths: MotorlogPaths,
        config: MotorlogConfig,
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let record = Arc::new(TomlKeyValueStore::new(paths.version_state_file()));
        let version_state = Arc::new(VersionStateStore::new(record, clock.clone()));

        let archiver = Arc::new(BackupArchiver::new(
            fs.clone(),
            clock.clone(),
            version_state.clone(),
            ArchiverSettings::from_config(&paths, &config),
        ));
        let exporter = Arc::new(ExportSerializer::new(
            fs,
            clock,
            paths.export_dir().to_path_buf(),
            version_state.current_declared_version(),
        ));

        tracing::debug!("Services wired over data root {:?}", paths.data_root());

        Self {
            paths,
            config,
            version_state,
            archiver,
            exporter,
        }
    }

    pub fn coordinator(&self, migrator: Arc<dyn SchemaMigrator>) -> MigrationCoordinator {
        MigrationCoordinator::new(self.version_state.clone(), self.archiver.clone(), migrator)
    }

    /// Coordinator that also exports `source` before migrating.
    pub fn coordinator_with_safety_export(
        &self,
        migrator: Arc<dyn SchemaMigrator>,
        source: Arc<dyn VehicleSource>,
    ) -> MigrationCoordinator {
        self.coordinator(migrator)
            .with_safety_export(source, self.exporter.clone())
    }
}
