//! Concrete storage, file system, backup and export implementations for
//! Motorlog.

pub mod backup_archiver;
pub mod config_service;
pub mod export_serializer;
pub mod json_vehicle_source;
pub mod local_file_system;
pub mod paths;
pub mod storage;

pub use crate::backup_archiver::{ArchiverSettings, BackupArchiver, StoreLayout};
pub use crate::config_service::ConfigService;
pub use crate::export_serializer::ExportSerializer;
pub use crate::json_vehicle_source::JsonVehicleSource;
pub use crate::local_file_system::LocalFileSystem;
pub use crate::paths::{MotorlogPaths, PathError};
pub use crate::storage::{AtomicTomlFile, MemoryKeyValueStore, TomlKeyValueStore};
