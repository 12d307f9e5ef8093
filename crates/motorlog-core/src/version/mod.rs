//! Schema version bookkeeping.

mod store;

pub use store::{
    CURRENT_SCHEMA_VERSION, LAST_BACKUP_PATH_KEY, LAST_MIGRATION_DATE_KEY, SCHEMA_VERSION_KEY,
    StoredVersion, VersionStateStore,
};
