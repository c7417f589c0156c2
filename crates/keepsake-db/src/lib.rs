//! Keepsake Database Layer
//!
//! Repositories for assets, processing status, the location cache and faces,
//! plus the store traits the enrichment worker programs against.

pub mod db;
pub mod store_traits;

pub use db::{
    AssetRepository, FaceRepository, LocationRepository, PlaceRepository,
    ProcessingStatusRepository,
};

pub use store_traits::{AssetStore, FaceStore, LocationStore, PlaceStore, StatusStore};
