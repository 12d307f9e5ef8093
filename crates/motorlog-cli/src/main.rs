use anyhow::Result;
use clap::{Parser, Subcommand};
use motorlog_application::MotorlogServices;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "motorlog")]
#[command(about = "Motorlog - schema migrations, backups and exports of the vehicle log", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Data directory, overriding the config file and the platform default
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the recorded schema version and backup state
    Status,
    /// Back up the store now
    Backup,
    /// List backups, most recent first
    Backups,
    /// Copy a backup over the live store
    Restore {
        /// Backup directory name, e.g. backup_2024-03-09_140500
        name: String,
    },
    /// Delete backups beyond the retention count
    Prune,
    /// Write an export snapshot of a vehicle file
    Export {
        /// JSON file with a vehicle list or a previous export
        #[arg(long, value_name = "JSON")]
        vehicles: PathBuf,
    },
    /// Run the migration check, backing up first when needed
    Migrate,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "motorlog=debug" } else { "motorlog=info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let services = MotorlogServices::load(cli.data_dir.as_deref())?;
    tracing::debug!("Using data directory {:?}", services.paths.data_root());

    match cli.command {
        Commands::Status => commands::status::show(&services).await?,
        Commands::Backup => commands::backup::create(&services).await?,
        Commands::Backups => commands::backup::list(&services).await?,
        Commands::Restore { name } => commands::backup::restore(&services, &name).await?,
        Commands::Prune => commands::backup::prune(&services).await?,
        Commands::Export { vehicles } => commands::export::write(&services, vehicles).await?,
        Commands::Migrate => commands::migrate::run(&services).await?,
    }

    Ok(())
}
