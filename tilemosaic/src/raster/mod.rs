//! Raster model shared by compositing and merging.
//!
//! Buffers are 8-bit single-band images holding raw stored values; gain and
//! offset on each quantity give the physical scaling.

mod layer;
mod mosaic;
mod template;

pub use layer::{QualityLayer, QuantityLayer, QuantityMeta, TileRaster};
pub use mosaic::MosaicRaster;
pub use template::{LayerSpec, LayerTemplate};
