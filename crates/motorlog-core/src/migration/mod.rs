//! Migration state, errors and the persistence-engine seam.

mod error;
mod migrator;
mod state;

pub use error::MigrationError;
pub use migrator::{NoopSchemaMigrator, SchemaMigrator};
pub use state::{MigrationPhase, MigrationStatus};
