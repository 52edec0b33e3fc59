/// Mean Earth radius in meters, shared by every distance computation in the
/// engine so the matcher, the detector, and location validation agree.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two WGS-84 coordinates, in meters.
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_distance_m(32.0853, 34.7818, 32.0853, 34.7818), 0.0);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // One degree of latitude is ~111.2 km on this sphere.
        let d = haversine_distance_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_short_urban_distance() {
        // Two points ~90 m apart along a Tel Aviv street.
        let d = haversine_distance_m(32.0853, 34.7818, 32.0861, 34.7818);
        assert!(d > 80.0 && d < 100.0, "got {d}");
    }

    #[test]
    fn test_symmetry() {
        let ab = haversine_distance_m(31.78, 35.22, 32.08, 34.78);
        let ba = haversine_distance_m(32.08, 34.78, 31.78, 35.22);
        assert!((ab - ba).abs() < 1e-6);
    }
}
