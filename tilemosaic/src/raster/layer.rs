//! Quantity and quality layers of tile rasters.

use std::collections::BTreeMap;
use std::fmt;

use image::{GrayImage, Luma};

use crate::domain::{PixelSize, SourceId, TileId};

/// Scaling and sentinel values of a quantity.
///
/// Physical values are `gain * raw + offset`; `nodata` marks pixels outside
/// any coverage and `undetect` pixels that were scanned without an echo.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityMeta {
    pub quantity: String,
    pub gain: f64,
    pub offset: f64,
    pub nodata: u8,
    pub undetect: u8,
}

impl QuantityMeta {
    pub fn new(
        quantity: impl Into<String>,
        gain: f64,
        offset: f64,
        nodata: u8,
        undetect: u8,
    ) -> Self {
        Self {
            quantity: quantity.into(),
            gain,
            offset,
            nodata,
            undetect,
        }
    }

    /// Physical value of a raw pixel; `None` for the sentinels.
    pub fn physical(&self, raw: u8) -> Option<f64> {
        if raw == self.nodata || raw == self.undetect {
            None
        } else {
            Some(self.gain * raw as f64 + self.offset)
        }
    }
}

impl fmt::Display for QuantityMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (gain {}, offset {}, nodata {}, undetect {})",
            self.quantity, self.gain, self.offset, self.nodata, self.undetect
        )
    }
}

/// Per-pixel quality field attached to a quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityLayer {
    /// Task identifier (`how/task`)
    pub task: String,
    /// Free-form attributes copied along with the layer
    pub attributes: BTreeMap<String, String>,
    pub data: GrayImage,
}

impl QualityLayer {
    /// Fill value for pixels without quality information.
    pub const FILL: u8 = 0;

    pub fn new(task: impl Into<String>, data: GrayImage) -> Self {
        Self {
            task: task.into(),
            attributes: BTreeMap::new(),
            data,
        }
    }

    /// Layer of the given size holding only the fill value.
    pub fn filled(task: impl Into<String>, size: PixelSize) -> Self {
        Self::new(task, filled_image(size, Self::FILL))
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// One measured field with its quality layers.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityLayer {
    pub meta: QuantityMeta,
    pub data: GrayImage,
    pub quality: Vec<QualityLayer>,
}

impl QuantityLayer {
    pub fn new(meta: QuantityMeta, data: GrayImage) -> Self {
        Self {
            meta,
            data,
            quality: Vec::new(),
        }
    }

    /// Layer of the given size holding only `nodata`.
    pub fn filled(meta: QuantityMeta, size: PixelSize) -> Self {
        let data = filled_image(size, meta.nodata);
        Self::new(meta, data)
    }

    pub fn with_quality(mut self, layer: QualityLayer) -> Self {
        self.quality.push(layer);
        self
    }

    pub fn name(&self) -> &str {
        &self.meta.quantity
    }

    pub fn quality(&self, task: &str) -> Option<&QualityLayer> {
        self.quality.iter().find(|q| q.task == task)
    }

    /// Raw value at a pixel, `None` outside the buffer.
    pub fn raw(&self, row: usize, col: usize) -> Option<u8> {
        let (x, y) = (u32::try_from(col).ok()?, u32::try_from(row).ok()?);
        self.data.get_pixel_checked(x, y).map(|p| p.0[0])
    }

    /// Pixel size of the quantity buffer.
    pub fn size(&self) -> PixelSize {
        image_size(&self.data)
    }
}

/// Composited result for one tile.
///
/// Owned by the worker that produced it until the merge consumes it.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRaster {
    pub tile_id: TileId,
    pub size: PixelSize,
    pub quantities: Vec<QuantityLayer>,
    /// Sources that contributed data to this tile.
    pub contributors: Vec<SourceId>,
}

impl TileRaster {
    pub fn new(tile_id: TileId, size: PixelSize) -> Self {
        Self {
            tile_id,
            size,
            quantities: Vec::new(),
            contributors: Vec::new(),
        }
    }

    pub fn with_quantity(mut self, layer: QuantityLayer) -> Self {
        self.quantities.push(layer);
        self
    }

    pub fn with_contributors(mut self, contributors: Vec<SourceId>) -> Self {
        self.contributors = contributors;
        self
    }

    pub fn quantity(&self, name: &str) -> Option<&QuantityLayer> {
        self.quantities.iter().find(|q| q.name() == name)
    }

    /// First buffer whose shape differs from the raster size, as
    /// `(layer, actual size)`.
    pub fn shape_mismatch(&self) -> Option<(String, PixelSize)> {
        for quantity in &self.quantities {
            let size = quantity.size();
            if size != self.size {
                return Some((quantity.name().to_string(), size));
            }
            for quality in &quantity.quality {
                let size = image_size(&quality.data);
                if size != self.size {
                    return Some((format!("{}/{}", quantity.name(), quality.task), size));
                }
            }
        }
        None
    }
}

fn filled_image(size: PixelSize, value: u8) -> GrayImage {
    GrayImage::from_pixel(size.width as u32, size.height as u32, Luma([value]))
}

fn image_size(image: &GrayImage) -> PixelSize {
    PixelSize::new(image.width() as usize, image.height() as usize)
}
