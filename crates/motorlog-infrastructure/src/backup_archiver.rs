//! Timestamped backup snapshots of the persistent-store files.
//!
//! Backups live in `<data root>/Backups/backup_<yyyy-MM-dd_HHmmss>/` and hold
//! verbatim copies of the main store file and its `-wal` / `-shm` sidecars.
//!
//! # Features
//!
//! - **Serialized**: every operation holds one async mutex, so no two backup or
//!   restore calls touch the tree at the same time
//! - **All or nothing**: a backup that fails mid-copy is deleted
//! - **Retention**: after each successful backup only the newest N are kept
//! - **Async-safe**: copy work runs in `tokio::task::spawn_blocking`

use async_trait::async_trait;
use motorlog_core::backup::{Backup, BackupArchive, BackupOutcome};
use motorlog_core::config::{
    DEFAULT_MINIMUM_FREE_BYTES, DEFAULT_RETENTION_COUNT, DEFAULT_STORE_FILE_NAME, MotorlogConfig,
};
use motorlog_core::migration::MigrationError;
use motorlog_core::storage::{Clock, FileSystem};
use motorlog_core::version::VersionStateStore;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task;

use crate::paths::MotorlogPaths;

const SIDECAR_SUFFIXES: [&str; 2] = ["-wal", "-shm"];

/// Naming convention of the persistent store files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLayout {
    store_file_name: String,
}

impl StoreLayout {
    pub fn new(store_file_name: impl Into<String>) -> Self {
        Self {
            store_file_name: store_file_name.into(),
        }
    }

    /// Whether `file_name` is the main store file or one of its sidecars.
    pub fn matches(&self, file_name: &str) -> bool {
        match file_name.strip_prefix(self.store_file_name.as_str()) {
            Some("") => true,
            Some(suffix) => SIDECAR_SUFFIXES.contains(&suffix),
            None => false,
        }
    }
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_FILE_NAME)
    }
}

/// Where backups are read from and written to, and how many are kept.
#[derive(Debug, Clone)]
pub struct ArchiverSettings {
    /// Directory holding the live store files.
    pub data_root: PathBuf,
    pub backups_root: PathBuf,
    pub layout: StoreLayout,
    pub retention_count: usize,
    pub minimum_free_bytes: u64,
}

impl ArchiverSettings {
    pub fn new(data_root: PathBuf, backups_root: PathBuf) -> Self {
        Self {
            data_root,
            backups_root,
            layout: StoreLayout::default(),
            retention_count: DEFAULT_RETENTION_COUNT,
            minimum_free_bytes: DEFAULT_MINIMUM_FREE_BYTES,
        }
    }

    pub fn from_config(paths: &MotorlogPaths, config: &MotorlogConfig) -> Self {
        Self {
            data_root: paths.data_root().to_path_buf(),
            backups_root: paths.backups_dir(),
            layout: StoreLayout::new(config.storage.store_file_name.clone()),
            retention_count: config.retention_count(),
            minimum_free_bytes: config.backup.minimum_free_bytes,
        }
    }
}

/// Creates, lists, prunes and restores backups.
pub struct BackupArchiver {
    inner: Arc<ArchiverInner>,
    lock: Mutex<()>,
}

struct ArchiverInner {
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    version_state: Arc<VersionStateStore>,
    settings: ArchiverSettings,
}

impl BackupArchiver {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        clock: Arc<dyn Clock>,
        version_state: Arc<VersionStateStore>,
        settings: ArchiverSettings,
    ) -> Self {
        Self {
            inner: Arc::new(ArchiverInner {
                fs,
                clock,
                version_state,
                settings,
            }),
            lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> &ArchiverSettings {
        &self.inner.settings
    }

    /// User-requested backup. Same rules as the pre-migration backup.
    pub async fn create_manual_backup(&self) -> Result<BackupOutcome, MigrationError> {
        tracing::info!("Creating manual backup");
        self.run_blocking(|inner| inner.create_backup(), |e| {
            MigrationError::backup_failed(e)
        })
        .await
    }

    /// Deletes all but the newest `retention_count` backups.
    ///
    /// Returns the number of backups removed. A backup that cannot be deleted
    /// is logged and skipped.
    pub async fn prune_old_backups(&self) -> Result<usize, MigrationError> {
        self.run_blocking(
            |inner| inner.prune(None).map_err(MigrationError::backup_failed),
            |e| MigrationError::backup_failed(e),
        )
        .await
    }

    /// Looks up a backup by directory name.
    pub async fn find_backup(&self, name: &str) -> Result<Option<Backup>, MigrationError> {
        let backups = self.available_backups().await?;
        Ok(backups.into_iter().find(|backup| backup.name == name))
    }

    async fn run_blocking<T, F>(
        &self,
        f: F,
        on_join_error: fn(String) -> MigrationError,
    ) -> Result<T, MigrationError>
    where
        F: FnOnce(&ArchiverInner) -> Result<T, MigrationError> + Send + 'static,
        T: Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let inner = Arc::clone(&self.inner);

        task::spawn_blocking(move || f(inner.as_ref()))
            .await
            .map_err(|e| on_join_error(format!("Backup task failed: {}", e)))?
    }
}

#[async_trait]
impl BackupArchive for BackupArchiver {
    async fn create_pre_migration_backup(&self) -> Result<BackupOutcome, MigrationError> {
        tracing::info!("Creating pre-migration backup");
        self.run_blocking(|inner| inner.create_backup(), |e| {
            MigrationError::backup_failed(e)
        })
        .await
    }

    async fn restore_from_backup(&self, backup: &Backup) -> Result<(), MigrationError> {
        let backup = backup.clone();
        self.run_blocking(move |inner| inner.restore(&backup), |e| {
            MigrationError::restore_failed(e)
        })
        .await
    }

    async fn available_backups(&self) -> Result<Vec<Backup>, MigrationError> {
        self.run_blocking(
            |inner| inner.list_backups().map_err(MigrationError::backup_failed),
            |e| MigrationError::backup_failed(e),
        )
        .await
    }
}

impl ArchiverInner {
    fn create_backup(&self) -> Result<BackupOutcome, MigrationError> {
        let root = &self.settings.backups_root;
        self.fs
            .create_dir_all(root)
            .map_err(|e| MigrationError::backup_failed(describe("create", root, &e)))?;

        self.check_free_space(root)?;

        let (name, dir) = self.allocate_directory();
        self.fs
            .create_dir_all(&dir)
            .map_err(|e| MigrationError::backup_failed(describe("create", &dir, &e)))?;

        let files = match self.copy_store_files(&dir) {
            Ok(files) => files,
            Err(e) => {
                tracing::error!("Backup {} failed, removing partial copy: {}", name, e);
                self.remove_quietly(&dir);
                return Err(MigrationError::backup_failed(e));
            }
        };

        if files.is_empty() {
            tracing::info!(
                "No store files in {:?}, nothing to back up",
                self.settings.data_root
            );
            self.remove_quietly(&dir);
            return Ok(BackupOutcome::NothingToBackUp);
        }

        let created_at =
            Backup::parse_directory_name(&name).unwrap_or_else(|| self.clock.now());
        let backup = Backup {
            name,
            path: dir,
            created_at,
            files,
        };
        tracing::info!("Created backup {} ({} files)", backup.name, backup.files.len());

        self.version_state.record_backup_path(&backup.path);

        match self.prune(Some(backup.name.as_str())) {
            Ok(0) => {}
            Ok(removed) => tracing::info!("Pruned {} old backup(s)", removed),
            Err(e) => tracing::warn!("Failed to prune old backups: {}", e),
        }

        Ok(BackupOutcome::Created(backup))
    }

    /// Fails only when free space is known to be short.
    fn check_free_space(&self, root: &Path) -> Result<(), MigrationError> {
        let required = self.settings.minimum_free_bytes;
        match self.fs.available_space(root) {
            Ok(available) if available < required => {
                tracing::warn!(
                    "Insufficient storage for backup: {} bytes available, {} required",
                    available,
                    required
                );
                Err(MigrationError::InsufficientStorage {
                    available_bytes: available,
                    required_bytes: required,
                })
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(
                    "Could not determine free space on {:?}, proceeding anyway: {}",
                    root,
                    e
                );
                Ok(())
            }
        }
    }

    fn allocate_directory(&self) -> (String, PathBuf) {
        let now = self.clock.now();
        let mut collision = 0;
        loop {
            let name = Backup::directory_name(&now, collision);
            let path = self.settings.backups_root.join(&name);
            if !self.fs.exists(&path) {
                return (name, path);
            }
            collision += 1;
        }
    }

    fn copy_store_files(&self, dir: &Path) -> io::Result<Vec<String>> {
        let data_root = &self.settings.data_root;
        if !self.fs.exists(data_root) {
            return Ok(Vec::new());
        }

        let mut sources: Vec<_> = self
            .fs
            .list_dir(data_root)?
            .into_iter()
            .filter(|entry| !entry.is_dir && self.settings.layout.matches(&entry.name))
            .collect();
        sources.sort_by(|a, b| a.name.cmp(&b.name));

        let mut copied = Vec::with_capacity(sources.len());
        for source in sources {
            let bytes = self.fs.copy_file(&source.path, &dir.join(&source.name))?;
            tracing::debug!("Backed up {} ({} bytes)", source.name, bytes);
            copied.push(source.name);
        }
        Ok(copied)
    }

    fn list_backups(&self) -> io::Result<Vec<Backup>> {
        let root = &self.settings.backups_root;
        if !self.fs.exists(root) {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in self.fs.list_dir(root)? {
            if !entry.is_dir {
                continue;
            }
            let Some(created_at) = Backup::parse_directory_name(&entry.name) else {
                continue;
            };

            let mut files: Vec<String> = self
                .fs
                .list_dir(&entry.path)?
                .into_iter()
                .filter(|file| !file.is_dir)
                .map(|file| file.name)
                .collect();
            files.sort();

            backups.push(Backup {
                name: entry.name,
                path: entry.path,
                created_at,
                files,
            });
        }

        // names encode creation time
        backups.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(backups)
    }

    /// Keeps the newest `retention_count` backups. `keep` is never removed and
    /// takes one of the slots, even when other backups carry later timestamps.
    fn prune(&self, keep: Option<&str>) -> io::Result<usize> {
        let backups = self.list_backups()?;
        let mut slots = self.settings.retention_count;
        if keep.is_some_and(|name| backups.iter().any(|b| b.name == name)) {
            slots = slots.saturating_sub(1);
        }

        let candidates = backups
            .iter()
            .filter(|b| Some(b.name.as_str()) != keep)
            .skip(slots);

        let mut removed = 0;
        for stale in candidates {
            match self.fs.remove_dir_all(&stale.path) {
                Ok(()) => {
                    tracing::debug!("Removed old backup {}", stale.name);
                    removed += 1;
                }
                Err(e) => tracing::warn!("Failed to remove old backup {}: {}", stale.name, e),
            }
        }

        Ok(removed)
    }

    /// Not atomic across files: a failure part-way leaves a mix of restored
    /// and live files.
    fn restore(&self, backup: &Backup) -> Result<(), MigrationError> {
        if !self.fs.exists(&backup.path) {
            return Err(MigrationError::restore_failed(format!(
                "backup {} not found at {:?}",
                backup.name, backup.path
            )));
        }

        let mut files: Vec<_> = self
            .fs
            .list_dir(&backup.path)
            .map_err(|e| MigrationError::restore_failed(describe("list", &backup.path, &e)))?
            .into_iter()
            .filter(|entry| !entry.is_dir)
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name));

        let data_root = &self.settings.data_root;
        self.fs
            .create_dir_all(data_root)
            .map_err(|e| MigrationError::restore_failed(describe("create", data_root, &e)))?;

        for file in files {
            let live = data_root.join(&file.name);
            if self.fs.exists(&live) {
                self.fs
                    .remove_file(&live)
                    .map_err(|e| MigrationError::restore_failed(describe("remove", &live, &e)))?;
            }
            self.fs
                .copy_file(&file.path, &live)
                .map_err(|e| MigrationError::restore_failed(describe("copy", &file.path, &e)))?;
            tracing::debug!("Restored {}", file.name);
        }

        tracing::info!("Restored store from backup {}", backup.name);
        Ok(())
    }

    fn remove_quietly(&self, dir: &Path) {
        if let Err(e) = self.fs.remove_dir_all(dir) {
            tracing::warn!("Failed to remove backup directory {:?}: {}", dir, e);
        }
    }
}

fn describe(action: &str, path: &Path, err: &io::Error) -> String {
    format!("failed to {} {:?}: {}", action, path, err)
}
