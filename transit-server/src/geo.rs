//! Great-circle distances and speed conversions.

/// Mean Earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance in meters between two `(lat, lng)` points in degrees.
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let inner = (delta_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (delta_lng / 2.0).sin().powi(2);
    let central_angle = 2.0 * inner.sqrt().min(1.0).asin();

    EARTH_RADIUS_M * central_angle
}

/// Distance between two `[lat, lng]` pairs.
pub fn distance_m(a: [f64; 2], b: [f64; 2]) -> f64 {
    haversine_m(a[0], a[1], b[0], b[1])
}

/// Seconds needed to cover `distance_m` at `speed_kmh`.
///
/// A non-positive speed yields infinity rather than a division panic.
pub fn seconds_at_speed(distance_m: f64, speed_kmh: f64) -> f64 {
    if speed_kmh <= 0.0 {
        return f64::INFINITY;
    }
    distance_m / (speed_kmh * 1000.0 / 3600.0)
}

/// Minutes needed to cover `distance_m` at `speed_kmh`.
pub fn minutes_at_speed(distance_m: f64, speed_kmh: f64) -> f64 {
    seconds_at_speed(distance_m, speed_kmh) / 60.0
}

/// Whether a position is usable for distance estimates.
///
/// The transit data service reports unknown positions as `(0, 0)`.
pub fn is_known_position(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && !(lat == 0.0 && lng == 0.0)
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}
