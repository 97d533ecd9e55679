//! Geographic primitives shared by the station resolvers and the aggregator:
//! a coordinate type, great-circle distance, and the coarse Taiwan region test.

use haversine::{distance, Location as HaversineLocation, Units};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
/// Both values are represented as `f64` degrees on the WGS84 datum.
///
/// # Examples
///
/// ```
/// use skyfuse::LatLon;
///
/// let taipei_101 = LatLon(25.0340, 121.5645);
/// assert_eq!(taipei_101.0, 25.0340); // Latitude
/// assert_eq!(taipei_101.1, 121.5645); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

impl LatLon {
    /// Whether latitude and longitude are finite and within WGS84 bounds.
    pub fn is_valid(&self) -> bool {
        self.0.is_finite() && self.1.is_finite() && (-90.0..=90.0).contains(&self.0) && (-180.0..=180.0).contains(&self.1)
    }
}

// Coarse rectangular bounds covering Taiwan proper plus the outlying islands
// (Penghu, Kinmen, Matsu). Deliberately permissive; not a polygon test.
const TAIWAN_LAT_MIN: f64 = 21.5;
const TAIWAN_LAT_MAX: f64 = 26.5;
const TAIWAN_LON_MIN: f64 = 118.0;
const TAIWAN_LON_MAX: f64 = 122.5;

/// Great-circle distance between two coordinates in kilometers (Haversine,
/// Earth radius 6371 km).
pub fn distance_km(a: LatLon, b: LatLon) -> f64 {
    distance(
        HaversineLocation {
            latitude: a.0,
            longitude: a.1,
        },
        HaversineLocation {
            latitude: b.0,
            longitude: b.1,
        },
        Units::Kilometers,
    )
}

/// True when the coordinate falls inside the Taiwan bounding box, which gates
/// the CWA/MOENV regional lookups.
pub fn is_in_taiwan(c: LatLon) -> bool {
    (TAIWAN_LAT_MIN..=TAIWAN_LAT_MAX).contains(&c.0) && (TAIWAN_LON_MIN..=TAIWAN_LON_MAX).contains(&c.1)
}
