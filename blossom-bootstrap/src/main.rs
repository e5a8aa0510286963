//! blossom-bootstrap - historical import and account administration

use anyhow::{Context, Result};
use blossom_bootstrap::accounts::create_staff;
use blossom_bootstrap::{run_import, Export};
use blossom_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use blossom_common::db::init_database;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "blossom-bootstrap")]
#[command(about = "Import historical records and manage staff accounts")]
#[command(version)]
struct Args {
    /// Root folder holding blossom.db
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a JSON export of volunteer history and print the report
    Import {
        /// Path to the export file
        file: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Make an account Grafeas staff and print a new API key
    CreateStaff {
        username: String,

        /// Also grant site staff (superadmin) rights
        #[arg(long)]
        superadmin: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml = TomlConfig::discover();
    let log_level = toml
        .as_ref()
        .ok()
        .and_then(|t| t.log_level.clone())
        .unwrap_or_else(|| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting Blossom bootstrap (blossom-bootstrap) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let toml = toml.unwrap_or_else(|e| {
        warn!("Ignoring config file, using defaults: {}", e);
        TomlConfig::default()
    });
    let root_folder = RootFolderResolver::new(toml)
        .with_cli_arg(args.root_folder)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path)
        .await
        .context("Failed to open database")?;

    match args.command {
        Command::Import { file, json } => {
            let export = Export::from_file(&file)
                .with_context(|| format!("Failed to load export {}", file.display()))?;
            let report = run_import(&pool, &export).await.context("Import failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report);
            }
        }
        Command::CreateStaff { username, superadmin } => {
            let (user, api_key) = create_staff(&pool, &username, superadmin)
                .await
                .context("Failed to create staff account")?;
            println!("{}: {}", user.username, api_key);
        }
    }

    pool.close().await;
    Ok(())
}
