//! Seam for the persistence engine that performs the structural migration.

use anyhow::Result;
use async_trait::async_trait;

use crate::schema_version::SchemaVersion;

/// The structural transformation of the store, delegated to the persistence
/// engine.
///
/// The coordinator treats `apply_migration` as opaque: it is only called once
/// a backup exists, and its result is awaited before the run advances.
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    /// Transforms the on-disk store from `from` to `to`.
    ///
    /// `from` is `None` when the recorded version could not be read.
    async fn apply_migration(
        &self,
        from: Option<&SchemaVersion>,
        to: &SchemaVersion,
    ) -> Result<()>;

    /// Checks the migrated store. Errors are reported as data corruption.
    async fn verify(&self, _version: &SchemaVersion) -> Result<()> {
        Ok(())
    }
}

/// Migrator for engines that upgrade their own store when it is opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSchemaMigrator;

#[async_trait]
impl SchemaMigrator for NoopSchemaMigrator {
    async fn apply_migration(
        &self,
        from: Option<&SchemaVersion>,
        to: &SchemaVersion,
    ) -> Result<()> {
        tracing::debug!(
            "No structural migration required ({} -> {})",
            from.map(|v| v.to_string()).unwrap_or_else(|| "unknown".to_string()),
            to
        );
        Ok(())
    }
}
