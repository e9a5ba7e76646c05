//! Tile compositing and dispatch errors.

use std::io;
use std::time::Duration;

use thiserror::Error;

use crate::domain::{PixelSize, SourceId, TileId};

/// Failure compositing one tile.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositeError {
    /// Measurement data of a source could not be fetched or decoded
    #[error("Failed to read data for source {source_id}: {message}")]
    SourceData { source_id: SourceId, message: String },

    /// The compositing collaborator reported an error
    #[error("Compositing tile {tile_id} failed: {message}")]
    Failed { tile_id: TileId, message: String },

    /// The compositor returned a raster for another tile
    #[error("Compositor returned a raster for tile {found}, expected {expected}")]
    WrongTile { expected: TileId, found: TileId },

    /// A layer does not have the tile's pixel shape
    #[error("Tile {tile_id} layer {layer} is {actual}, expected {expected}")]
    ShapeMismatch {
        tile_id: TileId,
        layer: String,
        expected: PixelSize,
        actual: PixelSize,
    },

    /// The compositor panicked
    #[error("Compositor panicked on tile {tile_id}: {message}")]
    Panicked { tile_id: TileId, message: String },
}

/// Failure of the dispatch barrier itself.
///
/// Always fails the whole cycle: dropping the pending tiles would leave
/// holes in the mosaic and corrupt its provenance.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Timed out after {timeout:?} waiting for tiles {}", join_ids(.pending))]
    Timeout {
        timeout: Duration,
        pending: Vec<TileId>,
    },

    #[error("Tile workers exited before reporting tiles {}", join_ids(.pending))]
    Disconnected { pending: Vec<TileId> },

    #[error("Failed to spawn tile worker: {0}")]
    Spawn(#[source] io::Error),
}

fn join_ids(ids: &[TileId]) -> String {
    ids.iter().map(TileId::as_str).collect::<Vec<_>>().join(", ")
}
