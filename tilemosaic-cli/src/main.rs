//! TileMosaic CLI - Command-line interface
//!
//! Inspects the configured tile grid, classifies sources against it and
//! maintains the per-area membership table.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tilemosaic::logging::init_logging;

use commands::common::load_config;
use commands::lut::LutAction;
use commands::partition::PartitionArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tilemosaic")]
#[command(version = tilemosaic::VERSION)]
#[command(about = "Tile grid and membership table tools for mosaic generation", long_about = None)]
struct Cli {
    /// Config file (default: ~/.tilemosaic/config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write a session log to the configured log directory
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the domain and its tiles
    Tiles,
    /// Inspect or maintain the membership table
    Lut {
        #[command(subcommand)]
        action: LutAction,
    },
    /// Classify sources and print which tiles they contribute to
    Partition(PartitionArgs),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(cli.config.as_deref())?;

    let _guard = if cli.log {
        let guard = init_logging(&config.logging.directory, &config.logging.file)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;
        tracing::info!(version = tilemosaic::VERSION, "TileMosaic CLI starting");
        Some(guard)
    } else {
        None
    };

    match cli.command {
        Commands::Tiles => commands::tiles::run(&config),
        Commands::Lut { action } => commands::lut::run(action, &config),
        Commands::Partition(args) => commands::partition::run(args, &config),
    }
}
