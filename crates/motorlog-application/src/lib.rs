//! Application layer: the migration coordinator and service wiring.

pub mod bootstrap;
pub mod migration_coordinator;

pub use bootstrap::MotorlogServices;
pub use migration_coordinator::MigrationCoordinator;
