//! Read access to the live vehicle graph.

use async_trait::async_trait;

use super::model::Vehicle;
use crate::error::Result;

/// Supplies the full vehicle graph, e.g. to build an export snapshot.
#[async_trait]
pub trait VehicleSource: Send + Sync {
    async fn load_vehicles(&self) -> Result<Vec<Vehicle>>;
}
