//! Reprojection of NTF Lambert II étendu (EPSG:27572) grid coordinates to WGS84
//! geographic coordinates (EPSG:4326).
//!
//! The chain follows the IGN geodesy algorithms: inverse Lambert conformal conic on the
//! Clarke 1880 (IGN) ellipsoid, conversion to geocentric coordinates, the NTF → WGS84
//! three-parameter translation, and back to geographic coordinates on the GRS80/WGS84
//! ellipsoid. This is the transformation PROJ applies for EPSG:27572 → EPSG:4326 when no
//! datum grid is installed.

use crate::LatLon;

const MAX_ITERATIONS: usize = 64;
const LATITUDE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis, meters.
    pub a: f64,
    /// First eccentricity squared.
    pub e2: f64,
}

impl Ellipsoid {
    pub fn e(&self) -> f64 {
        self.e2.sqrt()
    }

    /// Prime vertical radius of curvature at `phi` (radians).
    fn normal_radius(&self, phi: f64) -> f64 {
        self.a / (1.0 - self.e2 * phi.sin().powi(2)).sqrt()
    }

    /// Geographic (radians, ellipsoidal height 0) to geocentric cartesian.
    pub fn to_geocentric(&self, lambda: f64, phi: f64) -> [f64; 3] {
        let n = self.normal_radius(phi);
        [
            n * phi.cos() * lambda.cos(),
            n * phi.cos() * lambda.sin(),
            n * (1.0 - self.e2) * phi.sin(),
        ]
    }

    /// Geocentric cartesian to geographic `(lambda, phi)` in radians.
    pub fn to_geographic(&self, xyz: [f64; 3]) -> (f64, f64) {
        let [x, y, z] = xyz;
        let p = x.hypot(y);
        let lambda = y.atan2(x);
        let r = (x * x + y * y + z * z).sqrt();
        let mut phi = (z / (p * (1.0 - self.a * self.e2 / r))).atan();
        for _ in 0..MAX_ITERATIONS {
            let next = (z
                / p
                / (1.0
                    - self.a * self.e2 * phi.cos()
                        / (p * (1.0 - self.e2 * phi.sin().powi(2)).sqrt())))
            .atan();
            let converged = (next - phi).abs() < LATITUDE_TOLERANCE;
            phi = next;
            if converged {
                break;
            }
        }
        (lambda, phi)
    }
}

/// Clarke 1880 (IGN), the NTF ellipsoid.
pub const CLARKE_1880_IGN: Ellipsoid = Ellipsoid {
    a: 6_378_249.2,
    e2: 0.006_803_487_646_299_892_5,
};

pub const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    e2: 0.006_694_379_990_141_316_5,
};

/// Secant-cone constants of a Lambert conformal conic projection, in the IGN
/// "projection constants" form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LambertConic {
    pub n: f64,
    pub c: f64,
    pub xs: f64,
    pub ys: f64,
    /// Longitude of the central meridian relative to Greenwich, radians.
    pub lambda_c: f64,
    pub ellipsoid: Ellipsoid,
}

/// Lambert II étendu: Lambert zone II constants with the false northing raised to
/// 2 200 000 m so that the whole of metropolitan France projects with one zone.
pub const LAMBERT_II_EXTENDED: LambertConic = LambertConic {
    n: 0.728_968_627_421_411_6,
    c: 11_745_793.393_435_027,
    xs: 600_000.0,
    ys: 8_199_695.768_001_862,
    // Paris meridian, 2°20'14.025" E of Greenwich.
    lambda_c: 0.040_792_344_331_976_64,
    ellipsoid: CLARKE_1880_IGN,
};

impl LambertConic {
    /// Projected meters to geographic `(lambda, phi)` radians on the projection ellipsoid.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let dx = x - self.xs;
        let dy = y - self.ys;
        let r = dx.hypot(dy);
        let gamma = (dx / -dy).atan();
        let lambda = self.lambda_c + gamma / self.n;
        let isometric = -(r / self.c).abs().ln() / self.n;
        (lambda, latitude_from_isometric(isometric, self.ellipsoid.e()))
    }
}

/// Inverts the isometric latitude on an ellipsoid of eccentricity `e`.
fn latitude_from_isometric(isometric: f64, e: f64) -> f64 {
    let exp_l = isometric.exp();
    let mut phi = 2.0 * exp_l.atan() - std::f64::consts::FRAC_PI_2;
    for _ in 0..MAX_ITERATIONS {
        let es = e * phi.sin();
        let next =
            2.0 * (((1.0 + es) / (1.0 - es)).powf(e / 2.0) * exp_l).atan()
                - std::f64::consts::FRAC_PI_2;
        let converged = (next - phi).abs() < LATITUDE_TOLERANCE;
        phi = next;
        if converged {
            break;
        }
    }
    phi
}

/// Geocentric translation from NTF to WGS84, meters.
pub const NTF_TO_WGS84: [f64; 3] = [-168.0, -60.0, 320.0];

/// Reprojects a Lambert II étendu point given in meters.
///
/// # Examples
///
/// ```
/// use raindust::lambert2e_to_wgs84;
///
/// // Grid point near Notre-Dame de Paris
/// let location = lambert2e_to_wgs84(601_200.0, 2_428_700.0);
/// assert!((location.0 - 48.8566).abs() < 1e-3);
/// assert!((location.1 - 2.3528).abs() < 1e-3);
/// ```
pub fn lambert2e_to_wgs84(x: f64, y: f64) -> LatLon {
    let (lambda, phi) = LAMBERT_II_EXTENDED.inverse(x, y);
    let mut xyz = CLARKE_1880_IGN.to_geocentric(lambda, phi);
    for (coordinate, shift) in xyz.iter_mut().zip(NTF_TO_WGS84) {
        *coordinate += shift;
    }
    let (lambda, phi) = WGS84.to_geographic(xyz);
    LatLon(phi.to_degrees(), lambda.to_degrees())
}
