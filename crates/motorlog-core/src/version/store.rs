//! Persisted bookkeeping of the schema version the store was last written with.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::schema_version::SchemaVersion;
use crate::storage::{Clock, KeyValueStore};

/// Schema version this build reads and writes.
pub const CURRENT_SCHEMA_VERSION: SchemaVersion = SchemaVersion::new(2, 0, 0);

pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";
pub const LAST_MIGRATION_DATE_KEY: &str = "lastMigrationDate";
pub const LAST_BACKUP_PATH_KEY: &str = "lastBackupPath";

/// What the persisted record says about the stored schema version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredVersion {
    /// Nothing recorded yet: first launch.
    Missing,
    Valid(SchemaVersion),
    /// Something is recorded but it does not parse.
    Invalid(String),
    /// The record could not be read at all. Not the same as `Missing`: the
    /// store may hold an older version.
    Unreadable(String),
}

/// Reads and writes the version record.
///
/// Write failures are logged and swallowed. Losing this bookkeeping only
/// causes a redundant migration check on the next launch, never data loss.
pub struct VersionStateStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    declared: SchemaVersion,
}

impl VersionStateStore {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_declared_version(store, clock, CURRENT_SCHEMA_VERSION)
    }

    /// Builds a store that expects `declared` instead of [`CURRENT_SCHEMA_VERSION`].
    pub fn with_declared_version(
        store: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        declared: SchemaVersion,
    ) -> Self {
        Self {
            store,
            clock,
            declared,
        }
    }

    pub fn current_declared_version(&self) -> SchemaVersion {
        self.declared
    }

    pub fn read_stored_version(&self) -> StoredVersion {
        match self.store.get(SCHEMA_VERSION_KEY) {
            Ok(None) => StoredVersion::Missing,
            Ok(Some(raw)) => match SchemaVersion::parse(&raw) {
                Ok(version) => StoredVersion::Valid(version),
                Err(e) => {
                    tracing::warn!("Recorded schema version is unreadable: {}", e);
                    StoredVersion::Invalid(raw)
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read recorded schema version: {}", e);
                StoredVersion::Unreadable(e.to_string())
            }
        }
    }

    /// The recorded version, `None` before the first successful record.
    pub fn stored_version(&self) -> Option<SchemaVersion> {
        match self.read_stored_version() {
            StoredVersion::Valid(version) => Some(version),
            StoredVersion::Missing
            | StoredVersion::Invalid(_)
            | StoredVersion::Unreadable(_) => None,
        }
    }

    pub fn needs_migration(&self) -> bool {
        match self.read_stored_version() {
            StoredVersion::Missing => false,
            StoredVersion::Valid(version) => version != self.declared,
            StoredVersion::Invalid(_) | StoredVersion::Unreadable(_) => true,
        }
    }

    pub fn record_current_version(&self) {
        self.set_logged(SCHEMA_VERSION_KEY, &self.declared.to_string());
        tracing::info!("Recorded schema version {}", self.declared);
    }

    pub fn record_migration_success(&self, from: Option<&SchemaVersion>, to: &SchemaVersion) {
        self.set_logged(SCHEMA_VERSION_KEY, &to.to_string());
        self.set_logged(LAST_MIGRATION_DATE_KEY, &self.clock.now().to_rfc3339());
        tracing::info!(
            "Recorded migration {} -> {}",
            from.map(|v| v.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
            to
        );
    }

    pub fn record_backup_path(&self, path: &Path) {
        self.set_logged(LAST_BACKUP_PATH_KEY, &path.to_string_lossy());
    }

    pub fn last_migration_date(&self) -> Option<DateTime<Utc>> {
        let raw = self.get_logged(LAST_MIGRATION_DATE_KEY)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(date) => Some(date.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable last migration date '{}': {}", raw, e);
                None
            }
        }
    }

    pub fn last_backup_path(&self) -> Option<PathBuf> {
        self.get_logged(LAST_BACKUP_PATH_KEY).map(PathBuf::from)
    }

    fn get_logged(&self, key: &str) -> Option<String> {
        self.store.get(key).unwrap_or_else(|e| {
            tracing::warn!("Failed to read '{}' from version record: {}", key, e);
            None
        })
    }

    fn set_logged(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            tracing::warn!("Failed to persist '{}' to version record: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MotorlogError, Result};
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStore {
        entries: Mutex<HashMap<String, String>>,
    }

    impl KeyValueStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.entries.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.entries
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.entries.lock().unwrap().remove(key);
            Ok(())
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(MotorlogError::io("read-only volume"))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(MotorlogError::io("read-only volume"))
        }

        fn remove(&self, _key: &str) -> Result<()> {
            Err(MotorlogError::io("read-only volume"))
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap()
    }

    fn state_with(declared: SchemaVersion) -> (Arc<MapStore>, VersionStateStore) {
        let store = Arc::new(MapStore::default());
        let state = VersionStateStore::with_declared_version(
            store.clone(),
            Arc::new(FixedClock(fixed_now())),
            declared,
        );
        (store, state)
    }

    #[test]
    fn test_first_launch_needs_no_migration() {
        let (_, state) = state_with(SchemaVersion::new(2, 0, 0));
        assert_eq!(state.stored_version(), None);
        assert_eq!(state.read_stored_version(), StoredVersion::Missing);
        assert!(!state.needs_migration());
    }

    #[test]
    fn test_needs_migration_iff_stored_differs() {
        let declared = SchemaVersion::new(2, 0, 0);
        for stored in ["1.0.0", "2.0.0", "2.0.1", "3.0.0"] {
            let (store, state) = state_with(declared);
            store.set(SCHEMA_VERSION_KEY, stored).unwrap();
            let expected = SchemaVersion::parse(stored).unwrap() != declared;
            assert_eq!(state.needs_migration(), expected, "stored {stored}");
        }
    }

    #[test]
    fn test_unreadable_stored_version_needs_migration() {
        let (store, state) = state_with(SchemaVersion::new(2, 0, 0));
        store.set(SCHEMA_VERSION_KEY, "two").unwrap();
        assert_eq!(
            state.read_stored_version(),
            StoredVersion::Invalid("two".to_string())
        );
        assert_eq!(state.stored_version(), None);
        assert!(state.needs_migration());
    }

    #[test]
    fn test_record_current_version() {
        let (_, state) = state_with(SchemaVersion::new(2, 0, 0));
        state.record_current_version();
        assert_eq!(state.stored_version(), Some(SchemaVersion::new(2, 0, 0)));
        assert!(!state.needs_migration());
        assert_eq!(state.last_migration_date(), None);
    }

    #[test]
    fn test_record_migration_success_stamps_date() {
        let (_, state) = state_with(SchemaVersion::new(2, 0, 0));
        let from = SchemaVersion::new(1, 0, 0);
        state.record_migration_success(Some(&from), &SchemaVersion::new(2, 0, 0));
        assert_eq!(state.stored_version(), Some(SchemaVersion::new(2, 0, 0)));
        assert_eq!(state.last_migration_date(), Some(fixed_now()));
    }

    #[test]
    fn test_backup_path_round_trip() {
        let (_, state) = state_with(SchemaVersion::new(2, 0, 0));
        assert_eq!(state.last_backup_path(), None);
        state.record_backup_path(Path::new("/data/Backups/backup_2024-03-09_140500"));
        assert_eq!(
            state.last_backup_path(),
            Some(PathBuf::from("/data/Backups/backup_2024-03-09_140500"))
        );
    }

    #[test]
    fn test_store_failures_are_absorbed() {
        let state = VersionStateStore::new(Arc::new(BrokenStore), Arc::new(FixedClock(fixed_now())));
        state.record_current_version();
        state.record_migration_success(None, &CURRENT_SCHEMA_VERSION);
        assert_eq!(state.stored_version(), None);
        assert_eq!(state.last_backup_path(), None);
    }

    #[test]
    fn test_failed_read_is_not_first_launch() {
        let state = VersionStateStore::new(Arc::new(BrokenStore), Arc::new(FixedClock(fixed_now())));
        assert!(matches!(
            state.read_stored_version(),
            StoredVersion::Unreadable(_)
        ));
        assert!(state.needs_migration());
    }
}
