//! Backup models and the archive seam.

mod archive;
mod model;

pub use archive::BackupArchive;
pub use model::{BACKUP_DIR_PREFIX, BACKUP_TIMESTAMP_FORMAT, Backup, BackupOutcome};
