//! Mosaic domain model.
//!
//! A [`Domain`] describes the output raster: projection, extent, pixel scale
//! and size. A [`TileGrid`] partitions it into disjoint [`Tile`]s whose pixel
//! offsets fall exactly on the domain grid, so per-tile rasters can be pasted
//! into the mosaic without resampling.
//!
//! ```text
//!  domain origin (min_x, max_y)
//!  ┌───────────────┬───────────────┐
//!  │ tile A        │ tile B        │
//!  │ offset (0,0)  │ offset (0,50) │
//!  │               │               │
//!  └───────────────┴───────────────┘
//! ```
//!
//! Tiles are statically configured: their ids key the persisted membership
//! table, so they must stay stable across runs.

mod error;
mod extent;
mod grid;
mod types;

pub use error::ConfigError;
pub use extent::{Extent, IntersectionRule};
pub use grid::{
    Domain, Tile, TileDef, TileGrid, DEFAULT_ALIGNMENT_TOLERANCE, MAX_DOMAIN_PIXELS,
    RESERVED_BUCKETS,
};
pub use types::{PixelOffset, PixelSize, SourceId, TileId, SOURCE_ID_DELIMITER};
