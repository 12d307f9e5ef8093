use anyhow::Result;
use motorlog_application::MotorlogServices;
use motorlog_core::backup::BackupArchive;
use motorlog_core::version::StoredVersion;

pub async fn show(services: &MotorlogServices) -> Result<()> {
    let version_state = &services.version_state;

    let stored = match version_state.read_stored_version() {
        StoredVersion::Missing => "none (first launch)".to_string(),
        StoredVersion::Valid(version) => version.to_string(),
        StoredVersion::Invalid(raw) => format!("'{}' (unparseable)", raw),
        StoredVersion::Unreadable(reason) => format!("unknown (read failed: {})", reason),
    };

    println!("Data directory:    {}", services.paths.data_root().display());
    println!("Schema version:    {}", stored);
    println!("Declared version:  {}", version_state.current_declared_version());
    println!("Needs migration:   {}", version_state.needs_migration());
    println!(
        "Last migration:    {}",
        version_state
            .last_migration_date()
            .map(|date| date.to_rfc3339())
            .unwrap_or_else(|| "never".to_string())
    );
    println!(
        "Last backup:       {}",
        version_state
            .last_backup_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    );

    let backups = services.archiver.available_backups().await?;
    println!(
        "Backups:           {} (keeping {})",
        backups.len(),
        services.archiver.settings().retention_count
    );

    Ok(())
}
