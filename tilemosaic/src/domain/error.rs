//! Domain and tile grid configuration errors.

use thiserror::Error;

use super::{Extent, TileId};

/// Invalid domain or tile grid definition.
///
/// Always fatal: raised while the grid is built, before any source is
/// classified or any tile composited.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Invalid domain extent {extent}")]
    InvalidExtent { extent: Extent },

    #[error("Invalid pixel scale ({xscale}, {yscale}): must be finite and positive")]
    InvalidScale { xscale: f64, yscale: f64 },

    #[error(
        "Domain would be {width} x {height} pixels: each side must be between 1 and {max}",
        max = super::MAX_DOMAIN_PIXELS
    )]
    InvalidPixelSize { width: f64, height: f64 },

    #[error("Unknown projection '{0}'")]
    UnknownProjection(String),

    #[error("Invalid tile id '{id}': {reason}")]
    InvalidTileId { id: String, reason: String },

    #[error("Duplicate tile id '{0}'")]
    DuplicateTile(TileId),

    #[error("Tile {tile} extent {extent} lies outside the domain extent {domain}")]
    TileOutsideDomain {
        tile: TileId,
        extent: Extent,
        domain: Extent,
    },

    #[error("Tile {tile} {edge} edge is {offset_pixels:.4} pixels off the domain grid (tolerance {tolerance})")]
    Misaligned {
        tile: TileId,
        edge: &'static str,
        offset_pixels: f64,
        tolerance: f64,
    },

    #[error("Tile {0} covers no pixels")]
    EmptyTile(TileId),

    #[error("Tiles {first} and {second} overlap")]
    OverlappingTiles { first: TileId, second: TileId },

    #[error("Tiles cover {covered} of {expected} domain pixels")]
    IncompleteCoverage { covered: usize, expected: usize },

    #[error("Cannot split {size} pixels into {parts} tiles along the {axis} axis")]
    InvalidSplit {
        axis: &'static str,
        size: usize,
        parts: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misaligned_display() {
        let err = ConfigError::Misaligned {
            tile: TileId::new("gemNA_t1"),
            edge: "left",
            offset_pixels: 0.25,
            tolerance: 0.01,
        };
        let msg = err.to_string();
        assert!(msg.contains("gemNA_t1"));
        assert!(msg.contains("left"));
        assert!(msg.contains("0.2500"));
    }

    #[test]
    fn test_coverage_display() {
        let err = ConfigError::IncompleteCoverage {
            covered: 5000,
            expected: 10000,
        };
        assert_eq!(err.to_string(), "Tiles cover 5000 of 10000 domain pixels");
    }
}
