use anyhow::{Result, bail};
use motorlog_application::MotorlogServices;
use motorlog_core::migration::{MigrationPhase, NoopSchemaMigrator};
use std::sync::Arc;

pub async fn run(services: &MotorlogServices) -> Result<()> {
    let coordinator = services.coordinator(Arc::new(NoopSchemaMigrator));
    let status = coordinator.perform_migration_if_needed().await;

    match (status.phase, status.error) {
        (MigrationPhase::Failed, Some(error)) => {
            println!("Migration failed: {}", error);
            println!("  {}", error.recovery_suggestion());
            bail!("migration failed");
        }
        (phase, _) => {
            println!(
                "Migration {} at schema version {}",
                phase,
                services.version_state.current_declared_version()
            );
        }
    }
    Ok(())
}
