//! Reverse geocoding: coordinate to structured address, plus the heuristics
//! that reduce an address to an (area, city, country) place.

mod nominatim;
mod place_name;

use anyhow::Result;
use async_trait::async_trait;
use keepsake_core::models::GeoPoint;
use serde::Deserialize;

pub use nominatim::NominatimGeocoder;
pub use place_name::derive_place_name;

/// Structured reverse-geocoding answer (Nominatim `jsonv2` shape).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub address: AddressParts,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AddressParts {
    pub tourism: Option<String>,
    pub attraction: Option<String>,
    pub historic: Option<String>,
    pub leisure: Option<String>,
    pub amenity: Option<String>,
    pub building: Option<String>,
    pub natural: Option<String>,
    pub road: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub hamlet: Option<String>,
    pub municipality: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Reverse-geocode a point. `Ok(None)` when the service has no answer.
    async fn resolve(&self, point: GeoPoint) -> Result<Option<Address>>;
}
