//! Drives the "detect, back up, migrate, verify, record" sequence.
//!
//! The coordinator is the only place where migration errors become visible:
//! every failure ends the run in [`MigrationPhase::Failed`] with the error
//! attached, and nothing past `creatingBackup` runs unless the backup step
//! returned successfully in the same run.

use motorlog_core::backup::{BackupArchive, BackupOutcome};
use motorlog_core::migration::{MigrationError, MigrationPhase, MigrationStatus, SchemaMigrator};
use motorlog_core::schema_version::SchemaVersion;
use motorlog_core::vehicle::VehicleSource;
use motorlog_core::version::{StoredVersion, VersionStateStore};
use motorlog_infrastructure::ExportSerializer;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task;

const EVENT_CAPACITY: usize = 32;

/// Progress once the persistence engine has returned.
const MIGRATION_APPLIED_PROGRESS: f64 = 0.6;

/// Export written after the backup, before the store is touched.
struct SafetyExport {
    source: Arc<dyn VehicleSource>,
    serializer: Arc<ExportSerializer>,
}

/// State machine over one migration run.
///
/// Triggers are not re-entrant: a trigger that arrives while a run is in
/// flight is ignored and returns the current status.
pub struct MigrationCoordinator {
    version_state: Arc<VersionStateStore>,
    archive: Arc<dyn BackupArchive>,
    migrator: Arc<dyn SchemaMigrator>,
    safety_export: Option<SafetyExport>,
    status: watch::Sender<MigrationStatus>,
    events: broadcast::Sender<MigrationStatus>,
    run_lock: Mutex<()>,
}

impl MigrationCoordinator {
    pub fn new(
        version_state: Arc<VersionStateStore>,
        archive: Arc<dyn BackupArchive>,
        migrator: Arc<dyn SchemaMigrator>,
    ) -> Self {
        let (status, _) = watch::channel(MigrationStatus::idle());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            version_state,
            archive,
            migrator,
            safety_export: None,
            status,
            events,
            run_lock: Mutex::new(()),
        }
    }

    /// Also writes an export of `source` before migrating. A failed export
    /// is logged and does not stop the migration.
    pub fn with_safety_export(
        mut self,
        source: Arc<dyn VehicleSource>,
        serializer: Arc<ExportSerializer>,
    ) -> Self {
        self.safety_export = Some(SafetyExport { source, serializer });
        self
    }

    pub fn status(&self) -> MigrationStatus {
        self.status.borrow().clone()
    }

    /// Every transition from now on, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<MigrationStatus> {
        self.events.subscribe()
    }

    /// Runs the migration sequence if the coordinator is idle.
    ///
    /// In `completed` or `failed` this is a no-op; use
    /// [`Self::retry_migration`] to leave `failed`.
    pub async fn perform_migration_if_needed(&self) -> MigrationStatus {
        let Ok(_run) = self.run_lock.try_lock() else {
            tracing::info!("Migration already running, ignoring trigger");
            return self.status();
        };

        let current = self.status();
        if current.phase != MigrationPhase::Idle {
            tracing::debug!("Migration coordinator is {}, nothing to do", current.phase);
            return current;
        }

        self.run().await
    }

    /// Resets a failed run to `idle` and runs the sequence again.
    pub async fn retry_migration(&self) -> MigrationStatus {
        let Ok(_run) = self.run_lock.try_lock() else {
            tracing::info!("Migration already running, ignoring retry");
            return self.status();
        };

        let current = self.status();
        if current.phase != MigrationPhase::Failed {
            tracing::warn!("Retry requested while {}, ignoring", current.phase);
            return current;
        }

        tracing::info!("Retrying migration");
        self.transition(MigrationStatus::idle());
        self.run().await
    }

    async fn run(&self) -> MigrationStatus {
        self.advance(MigrationPhase::CheckingVersion);

        let declared = self.version_state.current_declared_version();
        let from = match self.version_state.read_stored_version() {
            StoredVersion::Missing => {
                tracing::info!("First launch, recording schema version {}", declared);
                self.version_state.record_current_version();
                return self.advance(MigrationPhase::Completed);
            }
            StoredVersion::Valid(stored) if stored == declared => {
                tracing::info!("Schema version {} is current", declared);
                return self.advance(MigrationPhase::Completed);
            }
            StoredVersion::Valid(stored) => {
                tracing::info!("Schema migration needed: {} -> {}", stored, declared);
                Some(stored)
            }
            StoredVersion::Invalid(raw) => {
                tracing::warn!(
                    "Recorded schema version '{}' is unreadable, migrating to {} from a backup",
                    raw,
                    declared
                );
                None
            }
            StoredVersion::Unreadable(reason) => {
                tracing::warn!(
                    "Version record could not be read ({}), migrating to {} from a backup",
                    reason,
                    declared
                );
                None
            }
        };

        match self.migrate(from, declared).await {
            Ok(()) => self.advance(MigrationPhase::Completed),
            Err(e) => self.fail(e),
        }
    }

    async fn migrate(
        &self,
        from: Option<SchemaVersion>,
        to: SchemaVersion,
    ) -> Result<(), MigrationError> {
        self.advance(MigrationPhase::CreatingBackup);
        match self.archive.create_pre_migration_backup().await? {
            BackupOutcome::Created(backup) => {
                tracing::info!("Pre-migration backup {} is in place", backup.name)
            }
            BackupOutcome::NothingToBackUp => {
                tracing::info!("No store files yet, migrating without a backup copy")
            }
        }

        self.write_safety_export().await;

        self.advance(MigrationPhase::Migrating);
        self.migrator
            .apply_migration(from.as_ref(), &to)
            .await
            .map_err(|e| MigrationError::migration_failed(format!("{:#}", e)))?;
        self.advance_to(MigrationPhase::Migrating, MIGRATION_APPLIED_PROGRESS);

        self.advance(MigrationPhase::Verifying);
        self.migrator
            .verify(&to)
            .await
            .map_err(|e| MigrationError::data_corruption(format!("{:#}", e)))?;

        self.version_state.record_migration_success(from.as_ref(), &to);
        Ok(())
    }

    async fn write_safety_export(&self) {
        let Some(export) = &self.safety_export else {
            return;
        };

        let vehicles = match export.source.load_vehicles().await {
            Ok(vehicles) => vehicles,
            Err(e) => {
                tracing::warn!("Skipping safety export, vehicles unavailable: {}", e);
                return;
            }
        };

        let serializer = Arc::clone(&export.serializer);
        let written = task::spawn_blocking(move || {
            let snapshot = serializer.export_snapshot(&vehicles);
            serializer.write_to_file(&snapshot)
        })
        .await;

        match written {
            Ok(Ok(path)) => tracing::info!("Safety export written to {:?}", path),
            Ok(Err(e)) => tracing::warn!("Safety export failed: {}", e),
            Err(e) => tracing::warn!("Safety export task failed: {}", e),
        }
    }

    fn advance(&self, phase: MigrationPhase) -> MigrationStatus {
        self.advance_to(phase, phase.checkpoint())
    }

    fn advance_to(&self, phase: MigrationPhase, progress: f64) -> MigrationStatus {
        let next = self.status().advance(phase, progress);
        self.transition(next)
    }

    fn fail(&self, error: MigrationError) -> MigrationStatus {
        tracing::error!(
            "Migration failed: {} ({})",
            error,
            error.recovery_suggestion()
        );
        let next = self.status().fail(error);
        self.transition(next)
    }

    fn transition(&self, next: MigrationStatus) -> MigrationStatus {
        tracing::info!(
            "Migration {} ({:.0}%)",
            next.phase,
            next.progress * 100.0
        );
        self.status.send_replace(next.clone());
        // no subscribers is fine
        let _ = self.events.send(next.clone());
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use motorlog_core::backup::Backup;
    use motorlog_core::error::MotorlogError;
    use motorlog_core::storage::{Clock, KeyValueStore, SystemClock};
    use motorlog_core::version::SCHEMA_VERSION_KEY;
    use motorlog_infrastructure::MemoryKeyValueStore;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    type Journal = Arc<StdMutex<Vec<&'static str>>>;

    struct ScriptedArchive {
        journal: Journal,
        result: Result<BackupOutcome, MigrationError>,
    }

    #[async_trait]
    impl BackupArchive for ScriptedArchive {
        async fn create_pre_migration_backup(&self) -> Result<BackupOutcome, MigrationError> {
            self.journal.lock().unwrap().push("backup");
            self.result.clone()
        }

        async fn restore_from_backup(&self, _backup: &Backup) -> Result<(), MigrationError> {
            unreachable!("the coordinator never restores")
        }

        async fn available_backups(&self) -> Result<Vec<Backup>, MigrationError> {
            Ok(Vec::new())
        }
    }

    struct ScriptedMigrator {
        journal: Journal,
        apply_error: Option<&'static str>,
        verify_error: Option<&'static str>,
        gate: Option<Arc<Notify>>,
    }

    impl ScriptedMigrator {
        fn ok(journal: Journal) -> Self {
            Self {
                journal,
                apply_error: None,
                verify_error: None,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl SchemaMigrator for ScriptedMigrator {
        async fn apply_migration(
            &self,
            _from: Option<&SchemaVersion>,
            _to: &SchemaVersion,
        ) -> anyhow::Result<()> {
            self.journal.lock().unwrap().push("migrate");
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.apply_error {
                Some(message) => Err(anyhow::anyhow!(message)),
                None => Ok(()),
            }
        }

        async fn verify(&self, _version: &SchemaVersion) -> anyhow::Result<()> {
            self.journal.lock().unwrap().push("verify");
            match self.verify_error {
                Some(message) => Err(anyhow::anyhow!(message)),
                None => Ok(()),
            }
        }
    }

    fn version_state(stored: Option<&str>) -> Arc<VersionStateStore> {
        let store = Arc::new(MemoryKeyValueStore::new());
        if let Some(raw) = stored {
            store.set(SCHEMA_VERSION_KEY, raw).unwrap();
        }
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Arc::new(VersionStateStore::with_declared_version(
            store,
            clock,
            SchemaVersion::new(2, 0, 0),
        ))
    }

    fn nothing_to_back_up() -> Result<BackupOutcome, MigrationError> {
        Ok(BackupOutcome::NothingToBackUp)
    }

    fn coordinator(
        stored: Option<&str>,
        backup: Result<BackupOutcome, MigrationError>,
        migrator: impl FnOnce(Journal) -> ScriptedMigrator,
    ) -> (MigrationCoordinator, Arc<VersionStateStore>, Journal) {
        let journal: Journal = Arc::default();
        let state = version_state(stored);
        let archive = Arc::new(ScriptedArchive {
            journal: journal.clone(),
            result: backup,
        });
        let migrator = Arc::new(migrator(journal.clone()));
        (
            MigrationCoordinator::new(state.clone(), archive, migrator),
            state,
            journal,
        )
    }

    fn drain(rx: &mut broadcast::Receiver<MigrationStatus>) -> Vec<MigrationStatus> {
        let mut seen = Vec::new();
        while let Ok(status) = rx.try_recv() {
            seen.push(status);
        }
        seen
    }

    #[tokio::test]
    async fn test_happy_path_progress_checkpoints() {
        let (coordinator, state, journal) =
            coordinator(Some("1.0.0"), nothing_to_back_up(), ScriptedMigrator::ok);
        let mut rx = coordinator.subscribe();

        let status = coordinator.perform_migration_if_needed().await;
        assert_eq!(status.phase, MigrationPhase::Completed);

        let trail: Vec<(MigrationPhase, f64)> =
            drain(&mut rx).into_iter().map(|s| (s.phase, s.progress)).collect();
        assert_eq!(
            trail,
            vec![
                (MigrationPhase::CheckingVersion, 0.1),
                (MigrationPhase::CreatingBackup, 0.2),
                (MigrationPhase::Migrating, 0.4),
                (MigrationPhase::Migrating, 0.6),
                (MigrationPhase::Verifying, 0.8),
                (MigrationPhase::Completed, 1.0),
            ]
        );
        assert_eq!(*journal.lock().unwrap(), vec!["backup", "migrate", "verify"]);
        assert_eq!(state.stored_version(), Some(SchemaVersion::new(2, 0, 0)));
        assert!(state.last_migration_date().is_some());
    }

    #[tokio::test]
    async fn test_backup_failure_never_reaches_migrating() {
        let (coordinator, state, journal) = coordinator(
            Some("1.0.0"),
            Err(MigrationError::backup_failed("disk I/O error")),
            ScriptedMigrator::ok,
        );
        let mut rx = coordinator.subscribe();

        let status = coordinator.perform_migration_if_needed().await;

        assert_eq!(status.phase, MigrationPhase::Failed);
        assert_eq!(status.progress, 0.2);
        assert_eq!(
            status.error,
            Some(MigrationError::backup_failed("disk I/O error"))
        );
        assert_eq!(*journal.lock().unwrap(), vec!["backup"]);
        assert!(drain(&mut rx)
            .iter()
            .all(|s| s.phase != MigrationPhase::Migrating));
        assert_eq!(state.stored_version(), Some(SchemaVersion::new(1, 0, 0)));
    }

    #[tokio::test]
    async fn test_engine_error_becomes_migration_failed() {
        let (coordinator, state, _) = coordinator(Some("1.0.0"), nothing_to_back_up(), |j| {
            ScriptedMigrator {
                apply_error: Some("table vehicles: constraint violated"),
                ..ScriptedMigrator::ok(j)
            }
        });

        let status = coordinator.perform_migration_if_needed().await;

        assert_eq!(status.phase, MigrationPhase::Failed);
        assert!(matches!(
            status.error,
            Some(MigrationError::MigrationFailed { ref underlying }) if underlying.contains("constraint violated")
        ));
        assert_eq!(state.stored_version(), Some(SchemaVersion::new(1, 0, 0)));
    }

    #[tokio::test]
    async fn test_verify_error_becomes_data_corruption() {
        let (coordinator, state, _) = coordinator(Some("1.0.0"), nothing_to_back_up(), |j| {
            ScriptedMigrator {
                verify_error: Some("orphaned events"),
                ..ScriptedMigrator::ok(j)
            }
        });

        let status = coordinator.perform_migration_if_needed().await;

        assert_eq!(
            status.error,
            Some(MigrationError::data_corruption("orphaned events"))
        );
        assert_eq!(status.progress, 0.8);
        assert_eq!(state.stored_version(), Some(SchemaVersion::new(1, 0, 0)));
    }

    #[tokio::test]
    async fn test_unreadable_record_takes_backup_path() {
        let (coordinator, state, journal) =
            coordinator(Some("two-point-oh"), nothing_to_back_up(), ScriptedMigrator::ok);

        let status = coordinator.perform_migration_if_needed().await;

        assert_eq!(status.phase, MigrationPhase::Completed);
        assert_eq!(journal.lock().unwrap().first(), Some(&"backup"));
        assert_eq!(state.stored_version(), Some(SchemaVersion::new(2, 0, 0)));
    }

    /// Holds `1.0.0` but fails the first read.
    struct FlakyStore {
        inner: MemoryKeyValueStore,
        failures_left: AtomicUsize,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> motorlog_core::error::Result<Option<String>> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(MotorlogError::io("resource temporarily unavailable"));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> motorlog_core::error::Result<()> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> motorlog_core::error::Result<()> {
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn test_failed_record_read_is_not_first_launch() {
        let inner = MemoryKeyValueStore::new();
        inner.set(SCHEMA_VERSION_KEY, "1.0.0").unwrap();
        let store = Arc::new(FlakyStore {
            inner,
            failures_left: AtomicUsize::new(1),
        });
        let state = Arc::new(VersionStateStore::with_declared_version(
            store,
            Arc::new(SystemClock),
            SchemaVersion::new(2, 0, 0),
        ));
        let journal: Journal = Arc::default();
        let archive = Arc::new(ScriptedArchive {
            journal: journal.clone(),
            result: nothing_to_back_up(),
        });
        let migrator = Arc::new(ScriptedMigrator::ok(journal.clone()));
        let coordinator = MigrationCoordinator::new(state.clone(), archive, migrator);

        let status = coordinator.perform_migration_if_needed().await;

        assert_eq!(status.phase, MigrationPhase::Completed);
        assert_eq!(*journal.lock().unwrap(), vec!["backup", "migrate", "verify"]);
        assert_eq!(state.stored_version(), Some(SchemaVersion::new(2, 0, 0)));
    }

    #[tokio::test]
    async fn test_terminal_states_ignore_trigger() {
        let (coordinator, _, journal) =
            coordinator(Some("2.0.0"), nothing_to_back_up(), ScriptedMigrator::ok);

        coordinator.perform_migration_if_needed().await;
        let mut rx = coordinator.subscribe();
        let again = coordinator.perform_migration_if_needed().await;

        assert_eq!(again.phase, MigrationPhase::Completed);
        assert!(drain(&mut rx).is_empty());
        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_retry_only_from_failed() {
        let (coordinator, _, journal) =
            coordinator(Some("2.0.0"), nothing_to_back_up(), ScriptedMigrator::ok);

        let status = coordinator.retry_migration().await;
        assert_eq!(status.phase, MigrationPhase::Idle);
        assert!(journal.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trigger_while_running_is_ignored() {
        let gate = Arc::new(Notify::new());
        let migrator_gate = gate.clone();
        let (coordinator, _, journal) = coordinator(Some("1.0.0"), nothing_to_back_up(), |j| {
            ScriptedMigrator {
                gate: Some(migrator_gate),
                ..ScriptedMigrator::ok(j)
            }
        });
        let coordinator = Arc::new(coordinator);
        let mut rx = coordinator.subscribe();

        let running = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.perform_migration_if_needed().await }
        });

        // wait until the run is parked inside the engine
        loop {
            let status = rx.recv().await.unwrap();
            if status.phase == MigrationPhase::Migrating {
                break;
            }
        }

        let ignored = coordinator.perform_migration_if_needed().await;
        assert_eq!(ignored.phase, MigrationPhase::Migrating);
        let ignored_retry = coordinator.retry_migration().await;
        assert_eq!(ignored_retry.phase, MigrationPhase::Migrating);

        gate.notify_one();
        let finished = running.await.unwrap();
        assert_eq!(finished.phase, MigrationPhase::Completed);
        assert_eq!(
            journal
                .lock()
                .unwrap()
                .iter()
                .filter(|step| **step == "migrate")
                .count(),
            1
        );
    }
}
