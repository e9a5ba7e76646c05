//! Ground positions along a sensor's range ring.

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Point reached from an origin after travelling `range_m` along `azimuth_deg`.
///
/// Uses the great-circle destination formula on a sphere whose radius is the
/// mean Earth radius plus the origin height. Azimuth is measured clockwise
/// from north. Returns `(lon, lat)` in degrees with longitude wrapped to
/// `[-180, 180)`.
pub fn destination(
    lon_deg: f64,
    lat_deg: f64,
    height_m: f64,
    range_m: f64,
    azimuth_deg: f64,
) -> (f64, f64) {
    let radius = EARTH_RADIUS_M + height_m;
    let delta = range_m / radius;
    let theta = azimuth_deg.to_radians();
    let lat1 = lat_deg.to_radians();
    let lon1 = lon_deg.to_radians();

    let sin_lat2 = lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();
    let lon2 = lon1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    let lon = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    (lon, lat2.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KM: f64 = 1000.0;

    #[test]
    fn test_north_moves_latitude_only() {
        let (lon, lat) = destination(10.0, 45.0, 0.0, 111.195 * KM, 0.0);
        assert!((lon - 10.0).abs() < 1e-9);
        assert!((lat - 46.0).abs() < 1e-3);
    }

    #[test]
    fn test_east_on_equator() {
        let (lon, lat) = destination(0.0, 0.0, 0.0, 111.195 * KM, 90.0);
        assert!((lon - 1.0).abs() < 1e-3);
        assert!(lat.abs() < 1e-9);
    }

    #[test]
    fn test_zero_range_returns_origin() {
        let (lon, lat) = destination(-75.5, 45.4, 120.0, 0.0, 231.0);
        assert!((lon + 75.5).abs() < 1e-9);
        assert!((lat - 45.4).abs() < 1e-9);
    }

    #[test]
    fn test_longitude_wraps_across_antimeridian() {
        let (lon, _) = destination(179.5, 0.0, 0.0, 111.195 * KM, 90.0);
        assert!((lon + 179.5).abs() < 1e-3);
    }
}
