//! Vehicle entity graph: vehicles own maintenance events and ownership records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::decimal::Decimal;

/// A tracked vehicle together with its full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: Uuid,
    pub name: String,
    pub make: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_plate: Option<String>,
    /// Odometer reading.
    pub mileage: Decimal,
    /// Engine hours, for vehicles that track them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub events: Vec<MaintenanceEvent>,
    #[serde(default)]
    pub ownership_records: Vec<OwnershipRecord>,
}

/// A maintenance, repair or inspection entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceEvent {
    pub id: Uuid,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub notes: String,
}

/// One period of ownership of a vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipRecord {
    pub id: Uuid,
    pub owner_name: String,
    pub start_date: NaiveDate,
    /// `None` for the current owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mileage_at_purchase: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
}

impl Vehicle {
    pub fn new(name: impl Into<String>, make: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            make: make.into(),
            model: model.into(),
            year: None,
            vin: None,
            license_plate: None,
            mileage: Decimal::from_scaled(0, 0),
            hours: None,
            notes: String::new(),
            events: Vec::new(),
            ownership_records: Vec::new(),
        }
    }

    /// Events ordered oldest first.
    pub fn events_by_date(&self) -> Vec<&MaintenanceEvent> {
        let mut events: Vec<&MaintenanceEvent> = self.events.iter().collect();
        events.sort_by_key(|event| event.date);
        events
    }

    /// The ownership record without an end date, if any.
    pub fn current_owner(&self) -> Option<&OwnershipRecord> {
        self.ownership_records
            .iter()
            .find(|record| record.end_date.is_none())
    }
}
