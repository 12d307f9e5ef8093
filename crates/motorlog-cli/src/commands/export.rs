use anyhow::Result;
use motorlog_application::MotorlogServices;
use motorlog_core::vehicle::VehicleSource;
use motorlog_infrastructure::JsonVehicleSource;
use std::path::PathBuf;
use tokio::task;

pub async fn write(services: &MotorlogServices, vehicles_file: PathBuf) -> Result<()> {
    let vehicles = JsonVehicleSource::new(vehicles_file).load_vehicles().await?;

    let exporter = services.exporter.clone();
    let (path, snapshot) = task::spawn_blocking(move || {
        let snapshot = exporter.export_snapshot(&vehicles);
        exporter.write_to_file(&snapshot).map(|path| (path, snapshot))
    })
    .await??;

    println!(
        "Exported {} vehicle(s), {} event(s), {} ownership record(s)",
        snapshot.vehicle_count(),
        snapshot.event_count(),
        snapshot.ownership_record_count()
    );
    println!("  {}", path.display());
    Ok(())
}
