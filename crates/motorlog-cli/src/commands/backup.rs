use anyhow::{Context, Result};
use motorlog_application::MotorlogServices;
use motorlog_core::backup::{BackupArchive, BackupOutcome};

pub async fn create(services: &MotorlogServices) -> Result<()> {
    match services.archiver.create_manual_backup().await? {
        BackupOutcome::Created(backup) => {
            println!("Created {} ({} files)", backup.name, backup.files.len());
            println!("  {}", backup.path.display());
        }
        BackupOutcome::NothingToBackUp => {
            println!(
                "Nothing to back up: no store files in {}",
                services.paths.data_root().display()
            );
        }
    }
    Ok(())
}

pub async fn list(services: &MotorlogServices) -> Result<()> {
    let backups = services.archiver.available_backups().await?;
    if backups.is_empty() {
        println!("No backups yet");
        return Ok(());
    }

    for backup in backups {
        println!(
            "{}  {}  {}",
            backup.name,
            backup.created_at.to_rfc3339(),
            backup.files.join(", ")
        );
    }
    Ok(())
}

pub async fn restore(services: &MotorlogServices, name: &str) -> Result<()> {
    let backup = services
        .archiver
        .find_backup(name)
        .await?
        .with_context(|| format!("No backup named '{}'", name))?;

    services.archiver.restore_from_backup(&backup).await?;
    println!("Restored {} file(s) from {}", backup.files.len(), backup.name);
    Ok(())
}

pub async fn prune(services: &MotorlogServices) -> Result<()> {
    let removed = services.archiver.prune_old_backups().await?;
    println!(
        "Removed {} backup(s), keeping the newest {}",
        removed,
        services.archiver.settings().retention_count
    );
    Ok(())
}
