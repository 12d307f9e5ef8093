//! Observable state of a migration run.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::MigrationError;

/// Phases of the migration state machine.
///
/// `Completed` and `Failed` are terminal; `Failed` is left only through an
/// explicit retry, which resets to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MigrationPhase {
    Idle,
    CheckingVersion,
    CreatingBackup,
    Migrating,
    Verifying,
    Completed,
    Failed,
}

impl MigrationPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Progress reported on entering this phase.
    pub fn checkpoint(&self) -> f64 {
        match self {
            Self::Idle => 0.0,
            Self::CheckingVersion => 0.1,
            Self::CreatingBackup => 0.2,
            Self::Migrating => 0.4,
            Self::Verifying => 0.8,
            Self::Completed => 1.0,
            // Failed keeps whatever progress was reached
            Self::Failed => 0.0,
        }
    }
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::CheckingVersion => "checkingVersion",
            Self::CreatingBackup => "creatingBackup",
            Self::Migrating => "migrating",
            Self::Verifying => "verifying",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Snapshot of the coordinator: phase, progress in `[0, 1]` and, when failed,
/// the error that stopped the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationStatus {
    pub phase: MigrationPhase,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<MigrationError>,
}

impl MigrationStatus {
    pub fn idle() -> Self {
        Self {
            phase: MigrationPhase::Idle,
            progress: 0.0,
            error: None,
        }
    }

    /// Moves to `phase`; progress never goes backwards within a run.
    pub fn advance(&self, phase: MigrationPhase, progress: f64) -> Self {
        Self {
            phase,
            progress: progress.clamp(self.progress, 1.0),
            error: None,
        }
    }

    pub fn fail(&self, error: MigrationError) -> Self {
        Self {
            phase: MigrationPhase::Failed,
            progress: self.progress,
            error: Some(error),
        }
    }
}

impl Default for MigrationStatus {
    fn default() -> Self {
        Self::idle()
    }
}
