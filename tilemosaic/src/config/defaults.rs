//! Default values for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::domain::{Extent, IntersectionRule, DEFAULT_ALIGNMENT_TOLERANCE};
use crate::footprint::DEFAULT_PIXEL_BUFFER;
use crate::generator::FailurePolicy;
use crate::logging::DEFAULT_LOG_FILE;

pub const DEFAULT_AREA_ID: &str = "mosaic";
pub const DEFAULT_PROJECTION: &str = "lonlat";
pub const DEFAULT_EXTENT: [f64; 4] = [-180.0, -90.0, 180.0, 90.0];
pub const DEFAULT_SCALE: f64 = 0.1;
pub const DEFAULT_TILE_ROWS: usize = 2;
pub const DEFAULT_TILE_COLS: usize = 2;

pub const DEFAULT_WORKERS: usize = 0;
pub const DEFAULT_TIMEOUT_SECS: u64 = 0;

pub const DEFAULT_QUANTITY: &str = "DBZH";
pub const DEFAULT_GAIN: f64 = 0.5;
pub const DEFAULT_OFFSET: f64 = -32.0;
pub const DEFAULT_NODATA: u8 = 255;
pub const DEFAULT_UNDETECT: u8 = 0;

/// Default log directory (~/.tilemosaic/logs).
pub fn default_log_dir() -> PathBuf {
    config_directory().join("logs")
}

impl Default for MosaicConfig {
    fn default() -> Self {
        let [min_x, min_y, max_x, max_y] = DEFAULT_EXTENT;
        Self {
            domain: DomainSettings {
                area_id: DEFAULT_AREA_ID.to_string(),
                projection: DEFAULT_PROJECTION.to_string(),
                extent: Extent::new(min_x, min_y, max_x, max_y),
                xscale: DEFAULT_SCALE,
                yscale: DEFAULT_SCALE,
                alignment_tolerance: DEFAULT_ALIGNMENT_TOLERANCE,
            },
            tiles: TileSettings::Regular {
                rows: DEFAULT_TILE_ROWS,
                cols: DEFAULT_TILE_COLS,
            },
            footprint: FootprintSettings {
                rule: IntersectionRule::default(),
                pixel_buffer: DEFAULT_PIXEL_BUFFER,
            },
            generation: GenerationSettings {
                workers: DEFAULT_WORKERS,
                timeout: DEFAULT_TIMEOUT_SECS,
                sequential: false,
                failure_policy: FailurePolicy::default(),
            },
            lut: LutSettings::default(),
            composite: CompositeSettings {
                quantities: vec![DEFAULT_QUANTITY.to_string()],
                quality_tasks: Vec::new(),
                gain: DEFAULT_GAIN,
                offset: DEFAULT_OFFSET,
                nodata: DEFAULT_NODATA,
                undetect: DEFAULT_UNDETECT,
            },
            logging: LoggingSettings {
                directory: default_log_dir(),
                file: DEFAULT_LOG_FILE.to_string(),
            },
        }
    }
}
