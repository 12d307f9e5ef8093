//! Vehicle graph read from a JSON document.

use async_trait::async_trait;
use motorlog_core::error::{MotorlogError, Result};
use motorlog_core::export::ExportSnapshot;
use motorlog_core::vehicle::{Vehicle, VehicleSource};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Accepted document shapes: a bare vehicle list, or a previous export.
#[derive(Deserialize)]
#[serde(untagged)]
enum VehicleDocument {
    List(Vec<Vehicle>),
    Export(ExportSnapshot),
}

/// Reads vehicles from a JSON file on every call.
#[derive(Debug, Clone)]
pub struct JsonVehicleSource {
    path: PathBuf,
}

impl JsonVehicleSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl VehicleSource for JsonVehicleSource {
    async fn load_vehicles(&self) -> Result<Vec<Vehicle>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            MotorlogError::io(format!("Failed to read {:?}: {}", self.path, e))
        })?;

        let document: VehicleDocument =
            serde_json::from_str(&content).map_err(|e| MotorlogError::Serialization {
                format: "JSON".to_string(),
                message: format!("{:?} is neither a vehicle list nor an export: {}", self.path, e),
            })?;

        let vehicles = match document {
            VehicleDocument::List(vehicles) => vehicles,
            VehicleDocument::Export(snapshot) => snapshot.to_vehicles()?,
        };
        tracing::debug!("Loaded {} vehicle(s) from {:?}", vehicles.len(), self.path);
        Ok(vehicles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motorlog_core::vehicle::Decimal;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_loads_vehicle_list() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vehicles.json");
        std::fs::write(
            &path,
            r#"[{
                "id": "6f1c2a3e-8d4b-4c5a-9e7f-0a1b2c3d4e5f",
                "name": "Wagon",
                "make": "Volvo",
                "model": "245",
                "mileage": "312456.70",
                "events": [{
                    "id": "0b6f8f7e-6a44-4d0c-8f3f-8b1f4c1d2e3a",
                    "title": "Oil change",
                    "date": "2024-02-29",
                    "cost": "89.95"
                }]
            }]"#,
        )
        .unwrap();

        let vehicles = JsonVehicleSource::new(path).load_vehicles().await.unwrap();
        assert_eq!(vehicles.len(), 1);
        assert_eq!(vehicles[0].mileage, Decimal::parse("312456.70").unwrap());
        assert_eq!(vehicles[0].events[0].cost.as_ref().unwrap().as_str(), "89.95");
    }

    #[tokio::test]
    async fn test_loads_previous_export() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("export.json");
        let vehicle = Vehicle::new("Skiff", "Yamaha", "F115");
        let snapshot = ExportSnapshot {
            export_date: "2024-03-09T14:05:07Z".to_string(),
            schema_version: "2.0.0".to_string(),
            app_version: "3.1.0".to_string(),
            vehicles: vec![(&vehicle).into()],
        };
        std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let vehicles = JsonVehicleSource::new(path).load_vehicles().await.unwrap();
        assert_eq!(vehicles, vec![vehicle]);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = JsonVehicleSource::new(temp.path().join("absent.json"))
            .load_vehicles()
            .await
            .unwrap_err();
        assert!(err.is_io());
    }
}
