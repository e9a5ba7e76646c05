//! Tile grid listing.

use tilemosaic::config::MosaicConfig;

use super::common::load_grid;
use crate::error::CliError;

/// Print the domain and every tile with its pixel placement.
pub fn run(config: &MosaicConfig) -> Result<(), CliError> {
    let grid = load_grid(config)?;
    let domain = grid.domain();

    println!("Area:       {}", domain.area_id());
    println!("Projection: {}", domain.projection());
    println!("Extent:     {}", domain.extent());
    println!(
        "Scale:      {} x {} ({} pixels)",
        domain.xscale(),
        domain.yscale(),
        domain.size()
    );
    println!();
    println!("{:<24} {:>12} {:>12}  EXTENT", "TILE", "OFFSET", "SIZE");

    for tile in grid.tiles() {
        println!(
            "{:<24} {:>12} {:>12}  {}",
            tile.id().as_str(),
            tile.offset().to_string(),
            tile.size().to_string(),
            tile.extent()
        );
    }

    println!();
    println!("{} tiles", grid.len());
    Ok(())
}
