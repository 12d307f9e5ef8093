//! Domain types, error taxonomy and capability traits for Motorlog.
//!
//! The crate holds no I/O of its own. Storage, the file system and the
//! persistence engine are reached through the traits in [`storage`],
//! [`backup`], [`migration`] and [`vehicle`], implemented by
//! `motorlog-infrastructure` and by test doubles.

pub mod backup;
pub mod config;
pub mod error;
pub mod export;
pub mod migration;
pub mod schema_version;
pub mod storage;
pub mod vehicle;
pub mod version;

// Re-export common types
pub use error::MotorlogError;
pub use migration::MigrationError;
pub use schema_version::SchemaVersion;
