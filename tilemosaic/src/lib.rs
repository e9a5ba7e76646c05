//! TileMosaic - tiled compositing of sensor readings into one raster mosaic
//!
//! Sources whose coverage only partially overlaps a large projected domain
//! are classified against a fixed grid of pixel-aligned tiles, each tile is
//! composited independently on a worker pool, and the tile rasters are pasted
//! back into a single mosaic with its quantity and quality layers.
//!
//! Source-to-tile membership is persisted in a per-area XML table, so the
//! geometry of a source is only evaluated the first time it is seen.
//!
//! # High-Level API
//!
//! ```ignore
//! use std::sync::Arc;
//! use tilemosaic::config::MosaicConfig;
//! use tilemosaic::generator::MosaicGenerator;
//! use tilemosaic::lut::MembershipCache;
//!
//! let config = MosaicConfig::load()?;
//! let generator = MosaicGenerator::from_config(&config, Arc::new(my_compositor))?;
//!
//! let mut lut = MembershipCache::load(&config.domain.area_id, config.lut_path())?;
//! let generation = generator.generate(&sources, &mut lut)?;
//! println!("nodes: {}", generation.mosaic.nodes_attribute());
//! ```

pub mod composite;
pub mod config;
pub mod domain;
pub mod footprint;
pub mod generator;
pub mod geo;
pub mod logging;
pub mod lut;
pub mod merge;
pub mod partition;
pub mod raster;

/// Version of the TileMosaic library and CLI.
///
/// Defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
