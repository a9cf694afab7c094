//! Geographic coordinate helpers.

use std::f64::consts::PI;

pub const DEG2RAD: f64 = PI / 180.0;
pub const RAD2DEG: f64 = 180.0 / PI;

/// Web-Mercator-style forward projection from degrees into normalized map
/// units: `(0, 0)` is the north-west corner of the world square, `(1, 1)`
/// the south-east corner.
pub fn geo2map(latitude: f64, longitude: f64) -> (f64, f64) {
    let x = (longitude + 180.0) / 360.0;
    let y = (PI - ((PI / 4.0) + (latitude * DEG2RAD / 2.0)).tan().ln()) / (2.0 * PI);
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo2map_origin() {
        let (x, y) = geo2map(0.0, 0.0);
        assert!((x - 0.5).abs() < 1e-12);
        assert!((y - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_geo2map_dateline() {
        let (x, _) = geo2map(0.0, 180.0);
        assert!((x - 1.0).abs() < 1e-12);
        let (x, _) = geo2map(0.0, -180.0);
        assert!(x.abs() < 1e-12);
    }

    #[test]
    fn test_geo2map_north_is_up() {
        // Northern latitudes map to smaller y than southern ones.
        let (_, y_north) = geo2map(45.0, 0.0);
        let (_, y_south) = geo2map(-45.0, 0.0);
        assert!(y_north < 0.5);
        assert!(y_south > 0.5);
        assert!((y_north + y_south - 1.0).abs() < 1e-12);
    }
}
