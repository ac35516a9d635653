//! Distance helpers.
//!
//! Planning and proximity checks use plain Euclidean distance in degree
//! space, which is good enough at city scale. Haversine is only used for the
//! descriptive route metrics.

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Euclidean distance between two (lat, lng) pairs, in degrees.
pub fn degree_distance(from: (f64, f64), to: (f64, f64)) -> f64 {
    let d_lat = to.0 - from.0;
    let d_lng = to.1 - from.1;
    (d_lat * d_lat + d_lng * d_lng).sqrt()
}

/// Great-circle distance between two points in kilometers.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Summed haversine length of consecutive points.
pub fn chain_length_km(points: &[(f64, f64)]) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .sum()
}

pub fn is_finite_location(location: (f64, f64)) -> bool {
    location.0.is_finite() && location.1.is_finite()
}
