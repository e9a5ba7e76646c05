//! Layer layout used for tiles without contributing sources.

use super::{QualityLayer, QuantityLayer, QuantityMeta, TileRaster};
use crate::domain::Tile;

/// One quantity of the template with the quality tasks it carries.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub meta: QuantityMeta,
    pub quality_tasks: Vec<String>,
}

/// Quantities and quality tasks every tile raster is expected to carry.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerTemplate {
    pub layers: Vec<LayerSpec>,
}

impl Default for LayerTemplate {
    /// Reflectivity in the common 0.5 dBZ / -32 dBZ encoding.
    fn default() -> Self {
        Self {
            layers: vec![LayerSpec {
                meta: QuantityMeta::new("DBZH", 0.5, -32.0, 255, 0),
                quality_tasks: Vec::new(),
            }],
        }
    }
}

impl LayerTemplate {
    pub fn new(layers: Vec<LayerSpec>) -> Self {
        Self { layers }
    }

    /// Raster of the tile's shape holding only nodata and quality fill values.
    pub fn empty_raster(&self, tile: &Tile) -> TileRaster {
        let size = tile.size();
        let mut raster = TileRaster::new(tile.id().clone(), size);
        for spec in &self.layers {
            let mut layer = QuantityLayer::filled(spec.meta.clone(), size);
            for task in &spec.quality_tasks {
                layer = layer.with_quality(QualityLayer::filled(task.as_str(), size));
            }
            raster = raster.with_quantity(layer);
        }
        raster
    }

    pub fn quantity_names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|l| l.meta.quantity.as_str())
    }
}
