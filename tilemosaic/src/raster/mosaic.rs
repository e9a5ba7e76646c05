//! Merged full-domain raster.

use super::QuantityLayer;
use crate::domain::{Extent, PixelSize, SourceId, TileId};

/// Final mosaic handed to downstream encoders.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicRaster {
    pub area_id: String,
    pub projection: String,
    pub extent: Extent,
    pub xscale: f64,
    pub yscale: f64,
    pub size: PixelSize,
    pub quantities: Vec<QuantityLayer>,
    /// Sorted, de-duplicated contributing sources.
    pub provenance: Vec<SourceId>,
    /// Tiles left as nodata because their compositing failed.
    pub missing_tiles: Vec<TileId>,
}

impl MosaicRaster {
    pub fn quantity(&self, name: &str) -> Option<&QuantityLayer> {
        self.quantities.iter().find(|q| q.name() == name)
    }

    /// Provenance as the comma-joined `nodes` attribute.
    pub fn nodes_attribute(&self) -> String {
        self.provenance
            .iter()
            .map(SourceId::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// True when every tile contributed to the mosaic.
    pub fn is_complete(&self) -> bool {
        self.missing_tiles.is_empty()
    }
}
