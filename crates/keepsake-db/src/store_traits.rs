//! Store traits used by the enrichment pipeline
//!
//! These traits define the minimal interface the worker needs from the
//! repositories, so tasks and the pipeline can be tested without a database.

use anyhow::Result;
use async_trait::async_trait;
use keepsake_core::error::AppError;
use keepsake_core::models::{Asset, CoordinateKey, Location, NewFace, NewLocation, Place, PlaceName};
use keepsake_core::TaskStatusMap;
use std::time::Duration;

use crate::db::{
    AssetRepository, FaceRepository, LocationRepository, PlaceRepository,
    ProcessingStatusRepository,
};

/// Asset reads and enrichment writes
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Ids of live, non-empty, settled assets missing a status for any of `task_names`
    async fn candidate_ids(&self, task_names: &[String], debounce: Duration) -> Result<Vec<i64>>;

    /// Load an asset with its bucket and owner
    async fn load(&self, id: i64) -> Result<Option<Asset>>;

    /// Persist the enrichment columns of an asset
    async fn save_enrichment(&self, asset: &Asset) -> Result<()>;
}

/// Per-asset task status persistence
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Status map of an asset; empty when nothing was recorded yet
    async fn load(&self, asset_id: i64) -> Result<TaskStatusMap>;

    async fn save(&self, asset_id: i64, statuses: &TaskStatusMap) -> Result<()>;
}

/// Reverse-geocoding cache keyed by rounded coordinates
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn find_location(&self, key: CoordinateKey) -> Result<Option<Location>>;

    async fn insert_location(&self, location: &NewLocation) -> Result<Location>;

    async fn link_place(&self, location_id: i64, place_id: i64) -> Result<()>;
}

/// Distinct (area, city, country) places
#[async_trait]
pub trait PlaceStore: Send + Sync {
    async fn find_or_create_place(&self, name: &PlaceName) -> Result<Place>;
}

/// Detected face persistence
#[async_trait]
pub trait FaceStore: Send + Sync {
    async fn insert_face(&self, face: &NewFace) -> Result<()>;
}

// Implementations for concrete repository types

#[async_trait]
impl AssetStore for AssetRepository {
    async fn candidate_ids(&self, task_names: &[String], debounce: Duration) -> Result<Vec<i64>> {
        AssetRepository::candidate_ids(self, task_names, debounce)
            .await
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }

    async fn load(&self, id: i64) -> Result<Option<Asset>> {
        self.get_with_relations(id)
            .await
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }

    async fn save_enrichment(&self, asset: &Asset) -> Result<()> {
        self.update_enrichment(asset)
            .await
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl StatusStore for ProcessingStatusRepository {
    async fn load(&self, asset_id: i64) -> Result<TaskStatusMap> {
        self.get(asset_id)
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }

    async fn save(&self, asset_id: i64, statuses: &TaskStatusMap) -> Result<()> {
        self.upsert(asset_id, statuses)
            .await
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl LocationStore for LocationRepository {
    async fn find_location(&self, key: CoordinateKey) -> Result<Option<Location>> {
        self.find_by_key(key)
            .await
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }

    async fn insert_location(&self, location: &NewLocation) -> Result<Location> {
        self.insert(location)
            .await
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }

    async fn link_place(&self, location_id: i64, place_id: i64) -> Result<()> {
        LocationRepository::link_place(self, location_id, place_id)
            .await
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl PlaceStore for PlaceRepository {
    async fn find_or_create_place(&self, name: &PlaceName) -> Result<Place> {
        self.find_or_create(name)
            .await
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }
}

#[async_trait]
impl FaceStore for FaceRepository {
    async fn insert_face(&self, face: &NewFace) -> Result<()> {
        self.insert(face)
            .await
            .map(|_| ())
            .map_err(|e: AppError| anyhow::anyhow!(e))
    }
}
