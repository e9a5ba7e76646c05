//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types; building domain objects from them lives in
//! [`MosaicConfig`]'s methods.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{ConfigError, Domain, Extent, IntersectionRule, TileDef, TileGrid};
use crate::generator::FailurePolicy;
use crate::raster::{LayerSpec, LayerTemplate, QuantityMeta};

use super::file::config_directory;

/// Complete configuration of a mosaic run.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicConfig {
    /// Domain settings
    pub domain: DomainSettings,
    /// Tile layout
    pub tiles: TileSettings,
    /// Footprint classification settings
    pub footprint: FootprintSettings,
    /// Tile dispatch settings
    pub generation: GenerationSettings,
    /// Membership table settings
    pub lut: LutSettings,
    /// Layer layout of composited tiles
    pub composite: CompositeSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[domain]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSettings {
    pub area_id: String,
    /// Projection identifier ("lonlat" or "merc")
    pub projection: String,
    pub extent: Extent,
    pub xscale: f64,
    pub yscale: f64,
    /// Tile edge alignment tolerance, as a fraction of a pixel in `[0, 1)`.
    ///
    /// Defaults to 0.01 pixel rather than anything near a whole pixel, so a
    /// tile edge off by a visible fraction of a pixel is reported.
    pub alignment_tolerance: f64,
}

/// Tile layout: `[tiles]` for a regular split, or `[tile.<id>]` sections.
#[derive(Debug, Clone, PartialEq)]
pub enum TileSettings {
    Regular { rows: usize, cols: usize },
    Explicit(Vec<TileDef>),
}

/// `[footprint]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct FootprintSettings {
    pub rule: IntersectionRule,
    /// Padding around snapped footprints, in domain pixels
    pub pixel_buffer: u32,
}

/// `[generation]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Worker threads; 0 means one per tile
    pub workers: usize,
    /// Barrier timeout in seconds; 0 means none
    pub timeout: u64,
    /// Composite tiles one after another on the calling thread
    pub sequential: bool,
    pub failure_policy: FailurePolicy,
}

/// `[lut]` section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LutSettings {
    /// Table location; defaults to `<config dir>/<area>_tile_node_LUT.xml`
    pub path: Option<PathBuf>,
}

/// `[composite]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSettings {
    pub quantities: Vec<String>,
    pub quality_tasks: Vec<String>,
    pub gain: f64,
    pub offset: f64,
    pub nodata: u8,
    pub undetect: u8,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl MosaicConfig {
    /// Validated domain.
    pub fn build_domain(&self) -> Result<Domain, ConfigError> {
        let d = &self.domain;
        Domain::new(
            d.area_id.as_str(),
            d.projection.as_str(),
            d.extent,
            d.xscale,
            d.yscale,
        )
    }

    /// Validated tile grid.
    pub fn build_grid(&self) -> Result<TileGrid, ConfigError> {
        let domain = self.build_domain()?;
        match &self.tiles {
            TileSettings::Regular { rows, cols } => TileGrid::regular_with_tolerance(
                domain,
                *rows,
                *cols,
                self.domain.alignment_tolerance,
            ),
            TileSettings::Explicit(defs) => {
                TileGrid::new(domain, defs, self.domain.alignment_tolerance)
            }
        }
    }

    /// Membership table location.
    pub fn lut_path(&self) -> PathBuf {
        self.lut.path.clone().unwrap_or_else(|| {
            config_directory().join(format!("{}_tile_node_LUT.xml", self.domain.area_id))
        })
    }

    /// Layer template for tiles without sources.
    pub fn layer_template(&self) -> LayerTemplate {
        let c = &self.composite;
        LayerTemplate::new(
            c.quantities
                .iter()
                .map(|quantity| LayerSpec {
                    meta: QuantityMeta::new(
                        quantity.as_str(),
                        c.gain,
                        c.offset,
                        c.nodata,
                        c.undetect,
                    ),
                    quality_tasks: c.quality_tasks.clone(),
                })
                .collect(),
        )
    }
}

impl GenerationSettings {
    /// Barrier timeout, `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}
