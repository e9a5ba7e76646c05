//! Reassembly of tile rasters into the full-domain mosaic.
//!
//! Tiles are disjoint and pixel-aligned, so merging is a pure scatter: every
//! tile buffer is pasted at its pixel offset, nothing is blended.

mod error;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Instant;

use image::{imageops, GrayImage};
use tracing::{debug, info};

pub use error::MergeError;

use crate::domain::{PixelOffset, PixelSize, SourceId, TileGrid, TileId};
use crate::raster::{MosaicRaster, QualityLayer, QuantityLayer, QuantityMeta, TileRaster};

/// Layout of one mosaic quantity, collected across tiles.
struct QuantityPlan {
    meta: QuantityMeta,
    /// Quality tasks in first-seen order, with the attributes of the first
    /// tile reporting them
    quality: Vec<(String, BTreeMap<String, String>)>,
}

/// Pastes tile rasters into one mosaic.
pub struct MosaicMerger {
    grid: Arc<TileGrid>,
}

impl MosaicMerger {
    pub fn new(grid: Arc<TileGrid>) -> Self {
        Self { grid }
    }

    /// Merge tile rasters, consuming them.
    ///
    /// The mosaic carries every quantity seen in any tile, each with the
    /// union of the quality tasks reported for it. Regions of tiles without
    /// a raster, or of tiles lacking a layer, keep nodata (quantities) or
    /// the quality fill value. `missing_tiles` is recorded on the mosaic.
    pub fn merge(
        &self,
        rasters: BTreeMap<TileId, TileRaster>,
        missing_tiles: Vec<TileId>,
    ) -> Result<MosaicRaster, MergeError> {
        let start = Instant::now();
        let domain = self.grid.domain();

        let mut placed = Vec::with_capacity(rasters.len());
        for (id, raster) in rasters {
            let tile = self
                .grid
                .tile(&id)
                .ok_or_else(|| MergeError::UnknownTile(id.clone()))?;
            if raster.tile_id != id {
                return Err(MergeError::WrongTile {
                    expected: id,
                    found: raster.tile_id,
                });
            }
            check_shape(tile.size(), &raster)?;
            placed.push((tile.offset(), raster));
        }

        let plans = plan_quantities(&placed)?;
        let size = domain.size();
        let mut quantities: Vec<QuantityLayer> = plans
            .into_iter()
            .map(|plan| {
                let mut layer = QuantityLayer::filled(plan.meta, size);
                for (task, attributes) in plan.quality {
                    let mut quality = QualityLayer::filled(task, size);
                    quality.attributes = attributes;
                    layer = layer.with_quality(quality);
                }
                layer
            })
            .collect();

        let mut provenance = BTreeSet::new();
        for (offset, raster) in placed {
            for quantity in &raster.quantities {
                let Some(target) = quantities.iter_mut().find(|q| q.name() == quantity.name())
                else {
                    continue;
                };
                paste(&mut target.data, &quantity.data, offset);
                for quality in &quantity.quality {
                    if let Some(full) = target.quality.iter_mut().find(|q| q.task == quality.task)
                    {
                        paste(&mut full.data, &quality.data, offset);
                    }
                }
            }
            debug!(
                tile_id = %raster.tile_id,
                row = offset.row,
                col = offset.col,
                "Pasted tile"
            );
            provenance.extend(raster.contributors);
        }

        let provenance: Vec<SourceId> = provenance.into_iter().collect();
        info!(
            area_id = domain.area_id(),
            quantities = quantities.len(),
            contributors = provenance.len(),
            missing = missing_tiles.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Merged mosaic"
        );

        Ok(MosaicRaster {
            area_id: domain.area_id().to_string(),
            projection: domain.projection().to_string(),
            extent: *domain.extent(),
            xscale: domain.xscale(),
            yscale: domain.yscale(),
            size,
            quantities,
            provenance,
            missing_tiles,
        })
    }
}

fn check_shape(expected: PixelSize, raster: &TileRaster) -> Result<(), MergeError> {
    let mismatch = |layer: String, actual| MergeError::ShapeMismatch {
        tile_id: raster.tile_id.clone(),
        layer,
        expected,
        actual,
    };
    if raster.size != expected {
        return Err(mismatch("raster".to_string(), raster.size));
    }
    match raster.shape_mismatch() {
        Some((layer, actual)) => Err(mismatch(layer, actual)),
        None => Ok(()),
    }
}

fn plan_quantities(placed: &[(PixelOffset, TileRaster)]) -> Result<Vec<QuantityPlan>, MergeError> {
    let mut plans: Vec<QuantityPlan> = Vec::new();

    for (_, raster) in placed {
        for quantity in &raster.quantities {
            let known = plans
                .iter()
                .position(|p| p.meta.quantity == quantity.meta.quantity);
            let index = match known {
                Some(i) if plans[i].meta != quantity.meta => {
                    return Err(MergeError::MetadataMismatch {
                        tile_id: raster.tile_id.clone(),
                        expected: plans[i].meta.clone(),
                        found: quantity.meta.clone(),
                    });
                }
                Some(i) => i,
                None => {
                    plans.push(QuantityPlan {
                        meta: quantity.meta.clone(),
                        quality: Vec::new(),
                    });
                    plans.len() - 1
                }
            };
            let plan = &mut plans[index];

            for quality in &quantity.quality {
                if !plan.quality.iter().any(|(task, _)| *task == quality.task) {
                    plan.quality
                        .push((quality.task.clone(), quality.attributes.clone()));
                }
            }
        }
    }
    Ok(plans)
}

fn paste(full: &mut GrayImage, part: &GrayImage, offset: PixelOffset) {
    imageops::replace(full, part, offset.col as i64, offset.row as i64);
}
