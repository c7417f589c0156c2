//! Database repositories for the enrichment pipeline
//!
//! Each repository owns one table (locations and places share a module) and
//! returns `AppError` so callers can tell database failures apart.

pub mod asset;
pub mod face;
pub mod location;
pub mod status;

pub use asset::AssetRepository;
pub use face::FaceRepository;
pub use location::{LocationRepository, PlaceRepository};
pub use status::ProcessingStatusRepository;
