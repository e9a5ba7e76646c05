//! Forward map projections from geographic coordinates.

use std::f64::consts::PI;
use std::sync::Arc;

use crate::domain::ConfigError;

/// Web Mercator valid latitude limit.
pub const MAX_MERCATOR_LAT: f64 = 85.05112878;

/// Spherical Web Mercator radius in meters.
const MERCATOR_RADIUS_M: f64 = 6_378_137.0;

/// Forward projection from geographic degrees into domain coordinates.
pub trait Projection: Send + Sync {
    /// Identifier as used in domain configuration.
    fn id(&self) -> &str;

    /// Project a longitude/latitude pair in degrees.
    ///
    /// Returns `None` when the point cannot be represented.
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;
}

/// Geographic grid: coordinates are longitude/latitude degrees.
#[derive(Debug, Clone, Copy, Default)]
pub struct LonLatProjection;

impl Projection for LonLatProjection {
    fn id(&self) -> &str {
        "lonlat"
    }

    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if lon.is_finite() && lat.is_finite() && (-90.0..=90.0).contains(&lat) {
            Some((lon, lat))
        } else {
            None
        }
    }
}

/// Spherical Web Mercator (EPSG:3857), coordinates in meters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercatorProjection;

impl Projection for WebMercatorProjection {
    fn id(&self) -> &str {
        "merc"
    }

    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if !lon.is_finite() || !lat.is_finite() || lat.abs() > MAX_MERCATOR_LAT {
            return None;
        }
        let x = MERCATOR_RADIUS_M * lon.to_radians();
        let y = MERCATOR_RADIUS_M * (PI / 4.0 + lat.to_radians() / 2.0).tan().ln();
        Some((x, y))
    }
}

/// Resolve a domain projection identifier.
pub fn projection_for_id(id: &str) -> Result<Arc<dyn Projection>, ConfigError> {
    match id.trim().to_lowercase().as_str() {
        "lonlat" | "longlat" | "wgs84" | "epsg:4326" => Ok(Arc::new(LonLatProjection)),
        "merc" | "webmerc" | "epsg:3857" => Ok(Arc::new(WebMercatorProjection)),
        _ => Err(ConfigError::UnknownProjection(id.to_string())),
    }
}
