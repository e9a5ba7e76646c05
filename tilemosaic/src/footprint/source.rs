//! Sensor geometry used to derive a coverage footprint.

use crate::domain::SourceId;

/// One sensor contributing to a mosaic cycle.
///
/// Only used to derive a footprint; nothing of it is retained once the
/// source is classified.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub id: SourceId,
    /// Origin longitude in degrees
    pub lon: f64,
    /// Origin latitude in degrees
    pub lat: f64,
    /// Antenna height above sea level in meters
    pub height: f64,
    /// Maximum unambiguous range in meters
    pub max_range: f64,
    /// Number of azimuth samples per scan
    pub nrays: u32,
}

impl Source {
    pub fn new(
        id: impl Into<SourceId>,
        lon: f64,
        lat: f64,
        height: f64,
        max_range: f64,
        nrays: u32,
    ) -> Self {
        Self {
            id: id.into(),
            lon,
            lat,
            height,
            max_range,
            nrays,
        }
    }

    /// Maximum range covered by a scan of `nbins` bins of `rscale` meters.
    ///
    /// One extra bin is added so the outermost bin is fully inside.
    pub fn max_range_from_bins(nbins: u32, rscale: f64) -> f64 {
        nbins as f64 * rscale + rscale
    }
}
