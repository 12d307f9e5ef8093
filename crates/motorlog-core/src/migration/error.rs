//! Structured failures of the migration subsystem.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that the migration coordinator surfaces to the user.
///
/// Underlying causes are captured as messages so the error can be cloned into
/// the observable [`super::MigrationStatus`] and sent to several subscribers.
/// `Display` is the human-readable description; [`MigrationError::recovery_suggestion`]
/// is the independent hint shown next to it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MigrationError {
    /// The pre-migration backup could not be created.
    #[error("Failed to create a backup of your data: {underlying}")]
    BackupFailed { underlying: String },

    /// The persistence engine reported an error while migrating.
    #[error("Failed to migrate your data to the new format: {underlying}")]
    MigrationFailed { underlying: String },

    /// Copying a backup back over the live store failed.
    #[error("Failed to restore data from backup: {underlying}")]
    RestoreFailed { underlying: String },

    /// A stored or supplied schema version could not be parsed.
    #[error("Invalid schema version: '{value}'")]
    InvalidSchemaVersion { value: String },

    /// Post-migration verification found inconsistent data.
    #[error("Data corruption detected: {details}")]
    DataCorruption { details: String },

    /// The backup volume does not have the required free space.
    #[error(
        "Not enough free storage to create a backup ({available_bytes} bytes available, {required_bytes} bytes required)"
    )]
    InsufficientStorage {
        available_bytes: u64,
        required_bytes: u64,
    },
}

impl MigrationError {
    pub fn backup_failed(underlying: impl ToString) -> Self {
        Self::BackupFailed {
            underlying: underlying.to_string(),
        }
    }

    pub fn migration_failed(underlying: impl ToString) -> Self {
        Self::MigrationFailed {
            underlying: underlying.to_string(),
        }
    }

    pub fn restore_failed(underlying: impl ToString) -> Self {
        Self::RestoreFailed {
            underlying: underlying.to_string(),
        }
    }

    pub fn invalid_schema_version(value: impl Into<String>) -> Self {
        Self::InvalidSchemaVersion {
            value: value.into(),
        }
    }

    pub fn data_corruption(details: impl Into<String>) -> Self {
        Self::DataCorruption {
            details: details.into(),
        }
    }

    /// What the user can do about this failure.
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::BackupFailed { .. } => {
                "Check that the app has permission to write to its data folder, then retry the migration."
            }
            Self::MigrationFailed { .. } => {
                "Your data was backed up before the migration started. Retry the migration, or restore the most recent backup."
            }
            Self::RestoreFailed { .. } => {
                "Some files may not have been restored. Retry the restore from the same backup before using the app."
            }
            Self::InvalidSchemaVersion { .. } => {
                "The recorded data format is unreadable. Retry the migration; a backup will be taken first."
            }
            Self::DataCorruption { .. } => {
                "Restore the most recent backup, then retry the migration."
            }
            Self::InsufficientStorage { .. } => {
                "Free up storage space on this device, then retry the migration."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_description_and_suggestion() {
        let errors = vec![
            MigrationError::backup_failed("disk full"),
            MigrationError::migration_failed("engine crashed"),
            MigrationError::restore_failed("permission denied"),
            MigrationError::invalid_schema_version("1.x"),
            MigrationError::data_corruption("orphaned events"),
            MigrationError::InsufficientStorage {
                available_bytes: 10,
                required_bytes: 100,
            },
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
            assert!(!err.recovery_suggestion().is_empty());
            assert_ne!(err.to_string(), err.recovery_suggestion());
        }
    }

    #[test]
    fn test_underlying_message_is_kept() {
        let err = MigrationError::backup_failed("No space left on device");
        assert!(err.to_string().contains("No space left on device"));
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let err = MigrationError::invalid_schema_version("abc");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "invalidSchemaVersion");
        assert_eq!(json["value"], "abc");
    }
}
