mod cli;
mod commands;
mod config;
mod data;
mod error;
mod logging;
mod utils;

use crate::cli::{Cli, Commands};
use crate::config::builder::{CliOverrides, build_config};
use crate::data::DataManager;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("\n❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn stored_database_path() -> Result<PathBuf> {
    Ok(DataManager::new()?.get_data_path().to_path_buf())
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    info!("species CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let query = cli.command.query();
    let overrides = CliOverrides {
        config: cli.config,
        database: cli.database,
        format: query.and_then(|q| q.format),
        precision: query.and_then(|q| q.precision),
    };

    let result = match cli.command {
        Commands::Init(args) => {
            info!("Dispatching to 'init' command.");
            let database = match overrides.database {
                Some(path) => path,
                None => stored_database_path()?,
            };
            commands::init::run(args, overrides.config, database)
        }
        Commands::Db(args) => {
            info!("Dispatching to 'db' command.");
            let config = build_config(&overrides, stored_database_path)?;
            commands::db::run(args, &config.database_path)
        }
        Commands::Isochrone(args) => {
            info!("Dispatching to 'isochrone' command.");
            let config = build_config(&overrides, stored_database_path)?;
            commands::query::run_isochrone(args, &config)
        }
        Commands::ColorMag(args) => {
            info!("Dispatching to 'color-mag' command.");
            let config = build_config(&overrides, stored_database_path)?;
            commands::query::run_color_magnitude(args, &config)
        }
        Commands::ColorColor(args) => {
            info!("Dispatching to 'color-color' command.");
            let config = build_config(&overrides, stored_database_path)?;
            commands::query::run_color_color(args, &config)
        }
    };

    match &result {
        Ok(_) => info!("✅ Command completed successfully."),
        Err(e) => error!("❌ Command failed: {}", e),
    }
    result
}
