pub mod asset;
pub mod face;
pub mod location;

pub use asset::{Asset, Bucket, GeoPoint, Owner, Thumbnail, UserPreferences};
pub use face::{BoundingBox, NewFace};
pub use location::{CoordinateKey, Location, NewLocation, Place, PlaceName};
