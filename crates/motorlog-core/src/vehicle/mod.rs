//! Vehicle domain models.

mod decimal;
mod model;
mod source;

pub use decimal::Decimal;
pub use model::{MaintenanceEvent, OwnershipRecord, Vehicle};
pub use source::VehicleSource;
