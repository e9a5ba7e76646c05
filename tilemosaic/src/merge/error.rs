//! Mosaic merge errors.

use thiserror::Error;

use crate::domain::{PixelSize, TileId};
use crate::raster::QuantityMeta;

/// Merge failures. All are fatal: pasting never resizes or rescales.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    #[error("Raster for tile {0} does not belong to the tile grid")]
    UnknownTile(TileId),

    #[error("Raster filed under tile {expected} was produced for tile {found}")]
    WrongTile { expected: TileId, found: TileId },

    #[error("Tile {tile_id} layer {layer} is {actual}, tile is {expected}")]
    ShapeMismatch {
        tile_id: TileId,
        layer: String,
        expected: PixelSize,
        actual: PixelSize,
    },

    #[error("Tile {tile_id} reports {found}, other tiles report {expected}")]
    MetadataMismatch {
        tile_id: TileId,
        expected: QuantityMeta,
        found: QuantityMeta,
    },
}
