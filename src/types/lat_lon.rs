/// Represents a geographical coordinate using latitude and longitude, in decimal degrees.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use raindust::LatLon;
///
/// let ile_rousse = LatLon(42.6336, 8.9375);
/// assert_eq!(ile_rousse.0, 42.6336); // Latitude
/// assert_eq!(ile_rousse.1, 8.9375); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.0.is_finite() && self.1.is_finite()
    }
}
