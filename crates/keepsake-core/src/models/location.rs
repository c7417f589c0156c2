//! Geocoding cache entities.
//!
//! A `Location` caches one reverse-geocoder answer for a rounded coordinate and
//! points at the deduplicated `Place` (area, city, country) it resolves to.

use serde::{Deserialize, Serialize};

use super::asset::GeoPoint;

/// Coordinate precision in units per degree. Four decimal places is roughly 11 m.
pub const COORDINATE_SCALE: f64 = 10_000.0;

/// A coordinate rounded to the cache precision, stored as integer ten-thousandths
/// of a degree so equality is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinateKey {
    pub lat_e4: i32,
    pub lon_e4: i32,
}

impl CoordinateKey {
    pub fn from_point(point: &GeoPoint) -> Self {
        Self {
            lat_e4: (point.latitude * COORDINATE_SCALE).round() as i32,
            lon_e4: (point.longitude * COORDINATE_SCALE).round() as i32,
        }
    }
}

/// The deduplicated (area, city, country) tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlaceName {
    pub area: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: PlaceName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub key: CoordinateKey,
    pub name: PlaceName,
    pub display_name: String,
    pub place_id: Option<i64>,
}

/// Fields for a location row that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLocation {
    pub key: CoordinateKey,
    pub name: PlaceName,
    pub display_name: String,
}
