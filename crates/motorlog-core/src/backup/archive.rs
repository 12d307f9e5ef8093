//! Backup archive seam consumed by the migration coordinator.

use async_trait::async_trait;

use super::model::{Backup, BackupOutcome};
use crate::migration::MigrationError;

/// Creates, enumerates and restores backups of the persistent store.
///
/// Implementations serialize every call: no two backup or restore operations
/// run at the same time.
#[async_trait]
pub trait BackupArchive: Send + Sync {
    /// Snapshots the current store files. A backup directory is either complete
    /// or removed; a partial backup is never left behind.
    async fn create_pre_migration_backup(&self) -> Result<BackupOutcome, MigrationError>;

    /// Copies every file of `backup` over the live store. Destructive; meant
    /// for manual recovery only.
    async fn restore_from_backup(&self, backup: &Backup) -> Result<(), MigrationError>;

    /// Backups on disk, most recent first. Empty if none were taken yet.
    async fn available_backups(&self) -> Result<Vec<Backup>, MigrationError>;
}
