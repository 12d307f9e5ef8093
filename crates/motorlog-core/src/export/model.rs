//! Portable, denormalized snapshot of the vehicle graph.
//!
//! Every decimal field is carried as exact decimal text and every date as a
//! fixed `YYYY-MM-DD` string, so the file round-trips without loss.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MotorlogError, Result};
use crate::vehicle::{Decimal, MaintenanceEvent, OwnershipRecord, Vehicle};

/// Calendar date format used in exports.
pub const EXPORT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Top-level export document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    /// RFC 3339 UTC timestamp of the export.
    pub export_date: String,
    pub schema_version: String,
    pub app_version: String,
    pub vehicles: Vec<VehicleExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleExport {
    pub id: String,
    pub name: String,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub mileage: Decimal,
    pub hours: Option<Decimal>,
    pub notes: String,
    pub events: Vec<EventExport>,
    pub ownership_records: Vec<OwnershipRecordExport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventExport {
    pub id: String,
    pub title: String,
    pub date: String,
    pub mileage: Option<Decimal>,
    pub hours: Option<Decimal>,
    pub cost: Option<Decimal>,
    pub category: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipRecordExport {
    pub id: String,
    pub owner_name: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub mileage_at_purchase: Option<Decimal>,
    pub notes: String,
}

impl ExportSnapshot {
    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn event_count(&self) -> usize {
        self.vehicles.iter().map(|v| v.events.len()).sum()
    }

    pub fn ownership_record_count(&self) -> usize {
        self.vehicles.iter().map(|v| v.ownership_records.len()).sum()
    }

    /// Rebuilds the domain graph from the snapshot.
    pub fn to_vehicles(&self) -> Result<Vec<Vehicle>> {
        self.vehicles.iter().map(Vehicle::try_from).collect()
    }
}

fn format_date(date: &NaiveDate) -> String {
    date.format(EXPORT_DATE_FORMAT).to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, EXPORT_DATE_FORMAT).map_err(|e| MotorlogError::Serialization {
        format: "export".to_string(),
        message: format!("invalid date '{}': {}", raw, e),
    })
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| MotorlogError::Serialization {
        format: "export".to_string(),
        message: format!("invalid id '{}': {}", raw, e),
    })
}

impl From<&Vehicle> for VehicleExport {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id.to_string(),
            name: vehicle.name.clone(),
            make: vehicle.make.clone(),
            model: vehicle.model.clone(),
            year: vehicle.year,
            vin: vehicle.vin.clone(),
            license_plate: vehicle.license_plate.clone(),
            mileage: vehicle.mileage.clone(),
            hours: vehicle.hours.clone(),
            notes: vehicle.notes.clone(),
            events: vehicle.events.iter().map(EventExport::from).collect(),
            ownership_records: vehicle
                .ownership_records
                .iter()
                .map(OwnershipRecordExport::from)
                .collect(),
        }
    }
}

impl From<&MaintenanceEvent> for EventExport {
    fn from(event: &MaintenanceEvent) -> Self {
        Self {
            id: event.id.to_string(),
            title: event.title.clone(),
            date: format_date(&event.date),
            mileage: event.mileage.clone(),
            hours: event.hours.clone(),
            cost: event.cost.clone(),
            category: event.category.clone(),
            notes: event.notes.clone(),
        }
    }
}

impl From<&OwnershipRecord> for OwnershipRecordExport {
    fn from(record: &OwnershipRecord) -> Self {
        Self {
            id: record.id.to_string(),
            owner_name: record.owner_name.clone(),
            start_date: format_date(&record.start_date),
            end_date: record.end_date.as_ref().map(format_date),
            purchase_price: record.purchase_price.clone(),
            mileage_at_purchase: record.mileage_at_purchase.clone(),
            notes: record.notes.clone(),
        }
    }
}

impl TryFrom<&VehicleExport> for Vehicle {
    type Error = MotorlogError;

    fn try_from(export: &VehicleExport) -> Result<Self> {
        Ok(Self {
            id: parse_id(&export.id)?,
            name: export.name.clone(),
            make: export.make.clone(),
            model: export.model.clone(),
            year: export.year,
            vin: export.vin.clone(),
            license_plate: export.license_plate.clone(),
            mileage: export.mileage.clone(),
            hours: export.hours.clone(),
            notes: export.notes.clone(),
            events: export
                .events
                .iter()
                .map(MaintenanceEvent::try_from)
                .collect::<Result<_>>()?,
            ownership_records: export
                .ownership_records
                .iter()
                .map(OwnershipRecord::try_from)
                .collect::<Result<_>>()?,
        })
    }
}

impl TryFrom<&EventExport> for MaintenanceEvent {
    type Error = MotorlogError;

    fn try_from(export: &EventExport) -> Result<Self> {
        Ok(Self {
            id: parse_id(&export.id)?,
            title: export.title.clone(),
            date: parse_date(&export.date)?,
            mileage: export.mileage.clone(),
            hours: export.hours.clone(),
            cost: export.cost.clone(),
            category: export.category.clone(),
            notes: export.notes.clone(),
        })
    }
}

impl TryFrom<&OwnershipRecordExport> for OwnershipRecord {
    type Error = MotorlogError;

    fn try_from(export: &OwnershipRecordExport) -> Result<Self> {
        Ok(Self {
            id: parse_id(&export.id)?,
            owner_name: export.owner_name.clone(),
            start_date: parse_date(&export.start_date)?,
            end_date: export.end_date.as_deref().map(parse_date).transpose()?,
            purchase_price: export.purchase_price.clone(),
            mileage_at_purchase: export.mileage_at_purchase.clone(),
            notes: export.notes.clone(),
        })
    }
}
