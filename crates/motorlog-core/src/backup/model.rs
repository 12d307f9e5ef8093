//! Backup snapshots of the persistent-store files.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::PathBuf;

/// Prefix of every backup directory name.
pub const BACKUP_DIR_PREFIX: &str = "backup_";

/// `chrono` format of the timestamp part of a backup directory name.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H%M%S";

// "yyyy-MM-dd_HHmmss"
const TIMESTAMP_LEN: usize = 17;

/// A complete backup directory.
///
/// Backups are never modified after creation, only deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    /// Directory name, e.g. `backup_2024-03-09_140500`.
    pub name: String,
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    /// Names of the store files inside the directory.
    pub files: Vec<String>,
}

impl Backup {
    /// Directory name for a backup taken at `at`, with an optional collision
    /// suffix. Names sort lexically in creation order.
    pub fn directory_name(at: &DateTime<Utc>, collision: u32) -> String {
        let stamp = at.format(BACKUP_TIMESTAMP_FORMAT);
        if collision == 0 {
            format!("{}{}", BACKUP_DIR_PREFIX, stamp)
        } else {
            format!("{}{}-{:02}", BACKUP_DIR_PREFIX, stamp, collision)
        }
    }

    /// Creation time encoded in a backup directory name, `None` if the name is
    /// not a backup name.
    pub fn parse_directory_name(name: &str) -> Option<DateTime<Utc>> {
        let rest = name.strip_prefix(BACKUP_DIR_PREFIX)?;
        let stamp = rest.get(..TIMESTAMP_LEN)?;
        let suffix = rest.get(TIMESTAMP_LEN..)?;

        if !suffix.is_empty() {
            let digits = suffix.strip_prefix('-')?;
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
        }

        NaiveDateTime::parse_from_str(stamp, BACKUP_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Result of a backup request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    Created(Backup),
    /// No store files exist yet (fresh install). Not a failure.
    NothingToBackUp,
}

impl BackupOutcome {
    pub fn backup(&self) -> Option<&Backup> {
        match self {
            Self::Created(backup) => Some(backup),
            Self::NothingToBackUp => None,
        }
    }
}
