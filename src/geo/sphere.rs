//! Spherical-earth helpers shared by the nearest-neighbour index and the distance reporting.

use crate::LatLon;
use haversine::{distance, Location as HaversineLocation, Units};

/// Mean Earth radius used to turn angular distances into meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Position of `location` on the unit sphere.
///
/// The straight-line (chord) distance between two such vectors grows monotonically with
/// the great-circle angle between the locations, so a Euclidean nearest neighbour in this
/// embedding is also the great-circle nearest neighbour.
pub fn unit_vector(location: LatLon) -> [f64; 3] {
    let phi = location.0.to_radians();
    let lambda = location.1.to_radians();
    [
        phi.cos() * lambda.cos(),
        phi.cos() * lambda.sin(),
        phi.sin(),
    ]
}

/// Central angle (radians) subtended by a chord of the unit sphere.
pub fn chord_to_angle(chord: f64) -> f64 {
    2.0 * (chord / 2.0).clamp(0.0, 1.0).asin()
}

/// Great-circle (haversine) distance in meters.
pub fn great_circle_m(from: LatLon, to: LatLon) -> f64 {
    let km = distance(
        HaversineLocation {
            latitude: from.0,
            longitude: from.1,
        },
        HaversineLocation {
            latitude: to.0,
            longitude: to.1,
        },
        Units::Kilometers,
    );
    km * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_angle_agrees_with_haversine() {
        let a = LatLon(42.6336, 8.9375);
        let b = LatLon(43.3494, 9.0198);
        let [ax, ay, az] = unit_vector(a);
        let [bx, by, bz] = unit_vector(b);
        let chord = ((ax - bx).powi(2) + (ay - by).powi(2) + (az - bz).powi(2)).sqrt();
        let from_chord = chord_to_angle(chord) * EARTH_RADIUS_M;
        let from_haversine = great_circle_m(a, b);
        assert!(
            (from_chord - from_haversine).abs() < 1e-3,
            "{from_chord} vs {from_haversine}"
        );
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = great_circle_m(LatLon(0.0, 0.0), LatLon(0.0, 1.0));
        let expected = EARTH_RADIUS_M * 1f64.to_radians();
        assert!((d - expected).abs() < 1e-6, "{d}");
    }

    #[test]
    fn test_antipodal_chord() {
        assert!((chord_to_angle(2.0) - std::f64::consts::PI).abs() < 1e-12);
    }
}
