//! Spherical geometry in nautical miles.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3_440.065;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }

    pub fn distance_nm(&self, other: &GeoPoint) -> f64 {
        haversine_distance_nm(self.lat, self.lon, other.lat, other.lon)
    }

    /// Midpoint of the straight segment in lat/lon space.
    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint::new((self.lat + other.lat) / 2.0, (self.lon + other.lon) / 2.0)
    }
}

/// Great-circle distance between two points in nautical miles (Haversine).
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
pub fn haversine_distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_NM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Offset a position by distance and bearing.
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_nm` - Distance in nautical miles
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_nm: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_nm.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_nm / EARTH_RADIUS_NM;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let lon2 = normalize_lon_rad(lon1 + y.atan2(x));

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Point at `fraction` (0..=1) of the way along the great circle from `from`
/// to `to`.
pub fn great_circle_fraction(from: &GeoPoint, to: &GeoPoint, fraction: f64) -> GeoPoint {
    let phi1 = from.lat.to_radians();
    let lambda1 = from.lon.to_radians();
    let phi2 = to.lat.to_radians();
    let lambda2 = to.lon.to_radians();

    let delta = from.distance_nm(to) / EARTH_RADIUS_NM;
    if delta <= 1e-12 {
        return *from;
    }

    let a = ((1.0 - fraction) * delta).sin() / delta.sin();
    let b = (fraction * delta).sin() / delta.sin();

    let x = a * phi1.cos() * lambda1.cos() + b * phi2.cos() * lambda2.cos();
    let y = a * phi1.cos() * lambda1.sin() + b * phi2.cos() * lambda2.sin();
    let z = a * phi1.sin() + b * phi2.sin();

    let lat = z.atan2((x * x + y * y).sqrt());
    let lon = y.atan2(x);
    GeoPoint::new(lat.to_degrees(), lon.to_degrees())
}

/// Point at `fraction` along the straight lat/lon segment, taking the short
/// way across the antimeridian.
pub fn straight_fraction(from: &GeoPoint, to: &GeoPoint, fraction: f64) -> GeoPoint {
    let mut dlon = to.lon - from.lon;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    let lat = from.lat + (to.lat - from.lat) * fraction;
    let lon = normalize_lon_deg(from.lon + dlon * fraction);
    GeoPoint::new(lat, lon)
}

fn normalize_lon_rad(lon: f64) -> f64 {
    (lon + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI
}

fn normalize_lon_deg(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude is roughly 60 NM
        let dist = haversine_distance_nm(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 60.04).abs() < 0.05);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance_nm(43.6777, -79.6248, 43.6777, -79.6248);
        assert!(dist < 1e-9);
    }

    #[test]
    fn test_great_circle_endpoints_and_midpoint() {
        let a = GeoPoint::new(43.6777, -79.6248);
        let b = GeoPoint::new(45.4706, -73.7408);
        let start = great_circle_fraction(&a, &b, 0.0);
        let end = great_circle_fraction(&a, &b, 1.0);
        assert!(start.distance_nm(&a) < 1e-6);
        assert!(end.distance_nm(&b) < 1e-6);

        let mid = great_circle_fraction(&a, &b, 0.5);
        let total = a.distance_nm(&b);
        assert!((mid.distance_nm(&a) - total / 2.0).abs() < 1e-6);
        assert!((mid.distance_nm(&b) - total / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_straight_fraction_crosses_antimeridian() {
        let a = GeoPoint::new(0.0, 179.0);
        let b = GeoPoint::new(0.0, -179.0);
        let mid = straight_fraction(&a, &b, 0.5);
        assert!((mid.lon.abs() - 180.0).abs() < 1e-9);
    }

    #[test]
    fn test_offset_by_bearing_round_trip_distance() {
        let (lat, lon) = offset_by_bearing(45.0, -75.0, 30.0, std::f64::consts::FRAC_PI_2);
        let dist = haversine_distance_nm(45.0, -75.0, lat, lon);
        assert!((dist - 30.0).abs() < 1e-6);
        assert!((lat - 45.0).abs() < 0.01);
        assert!(lon > -75.0);
    }
}
