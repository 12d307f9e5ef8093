//! Export snapshot documents.

mod model;

pub use model::{
    EXPORT_DATE_FORMAT, EventExport, ExportSnapshot, OwnershipRecordExport, VehicleExport,
};
