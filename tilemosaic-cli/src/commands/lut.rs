//! Membership table CLI commands.

use clap::Subcommand;
use tilemosaic::config::MosaicConfig;
use tilemosaic::domain::SourceId;

use super::common::{load_grid, load_lut};
use crate::error::CliError;

/// Membership table subcommands.
#[derive(Debug, Subcommand)]
pub enum LutAction {
    /// Show every tile bucket and the outside/undetermined lists
    Show,
    /// List tiles stored in the table that the current grid no longer defines
    Stale,
    /// Forget a source so its footprint is evaluated again on the next run
    Invalidate {
        /// Source identifier (e.g. `sehem`)
        source: String,
    },
}

/// Run a membership table subcommand.
pub fn run(action: LutAction, config: &MosaicConfig) -> Result<(), CliError> {
    let lut = load_lut(config)?;
    let path = config.lut_path();

    match action {
        LutAction::Show => {
            println!("Membership table: {}", path.display());
            println!("Area: {}", lut.area_id());
            println!();

            for (tile_id, bucket) in lut.tile_buckets() {
                let offset = bucket
                    .upper_left
                    .map(|o| o.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{} (upper_left {}): {}",
                    tile_id,
                    offset,
                    join(bucket.members.iter().map(|s| s.as_str()))
                );
            }
            println!("outside: {}", join(lut.outside().iter().map(|s| s.as_str())));
            println!(
                "undetermined: {}",
                join(lut.undetermined().iter().map(|s| s.as_str()))
            );
            println!();
            println!("{} classified sources", lut.len());
            Ok(())
        }
        LutAction::Stale => {
            let grid = load_grid(config)?;
            let stale = lut.stale_tiles(&grid);
            if stale.is_empty() {
                println!("No stale tiles in {}", path.display());
            } else {
                for tile_id in &stale {
                    println!("{}", tile_id);
                }
                println!();
                println!("{} stale tiles", stale.len());
            }
            Ok(())
        }
        LutAction::Invalidate { source } => {
            let mut lut = lut;
            let id = SourceId::new(&source);
            if !lut.invalidate(&id) {
                return Err(CliError::UnknownSource(source));
            }
            lut.persist()?;
            println!("Invalidated {} in {}", id, path.display());
            Ok(())
        }
    }
}

fn join<'a>(ids: impl Iterator<Item = &'a str>) -> String {
    let ids: Vec<&str> = ids.collect();
    if ids.is_empty() {
        "none".to_string()
    } else {
        ids.join(", ")
    }
}
