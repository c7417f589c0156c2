//! Resolve an asset's GPS coordinate to a deduplicated place.
//!
//! Answers are cached per rounded coordinate, so assets taken at the same spot
//! cost a single geocoder call between them.

use async_trait::async_trait;
use keepsake_core::models::{Asset, CoordinateKey, GeoPoint, Location, NewLocation};
use keepsake_core::TaskStatus;
use keepsake_db::{AssetStore, LocationStore, PlaceStore};
use keepsake_processing::{derive_place_name, Geocoder};
use keepsake_storage::StorageProvider;
use std::sync::Arc;

use crate::task::{EnrichmentTask, TaskOutcome};

pub struct LocationTask {
    assets: Arc<dyn AssetStore>,
    locations: Arc<dyn LocationStore>,
    places: Arc<dyn PlaceStore>,
    geocoder: Arc<dyn Geocoder>,
}

impl LocationTask {
    pub fn new(
        assets: Arc<dyn AssetStore>,
        locations: Arc<dyn LocationStore>,
        places: Arc<dyn PlaceStore>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            assets,
            locations,
            places,
            geocoder,
        }
    }

    /// Place id for a point, going through the location cache.
    async fn resolve_place(&self, asset_id: i64, point: GeoPoint) -> Result<i64, TaskStatus> {
        let key = CoordinateKey::from_point(&point);

        let cached = self.locations.find_location(key).await.map_err(|e| {
            tracing::warn!(asset.id = asset_id, error = %e, "Location cache lookup failed");
            TaskStatus::FailedDb
        })?;

        let location = match cached {
            Some(Location {
                place_id: Some(place_id),
                ..
            }) => {
                tracing::debug!(asset.id = asset_id, place.id = place_id, "Location cache hit");
                return Ok(place_id);
            }
            Some(location) => location,
            None => self.geocode(asset_id, key, point).await?,
        };

        let place = self
            .places
            .find_or_create_place(&location.name)
            .await
            .map_err(|e| {
                tracing::warn!(asset.id = asset_id, error = %e, "Failed to find or create place");
                TaskStatus::FailedDb
            })?;

        self.locations
            .link_place(location.id, place.id)
            .await
            .map_err(|e| {
                tracing::warn!(
                    asset.id = asset_id,
                    location.id = location.id,
                    error = %e,
                    "Failed to link location to place"
                );
                TaskStatus::FailedDb
            })?;

        Ok(place.id)
    }

    async fn geocode(
        &self,
        asset_id: i64,
        key: CoordinateKey,
        point: GeoPoint,
    ) -> Result<Location, TaskStatus> {
        let address = match self.geocoder.resolve(point).await {
            Ok(Some(address)) => address,
            Ok(None) => {
                tracing::info!(asset.id = asset_id, "Geocoder returned no address");
                return Err(TaskStatus::Failed);
            }
            Err(e) => {
                tracing::warn!(asset.id = asset_id, error = %e, "Reverse geocoding failed");
                return Err(TaskStatus::Failed);
            }
        };

        let new_location = NewLocation {
            key,
            name: derive_place_name(&address),
            display_name: address.display_name,
        };

        self.locations
            .insert_location(&new_location)
            .await
            .map_err(|e| {
                tracing::warn!(asset.id = asset_id, error = %e, "Failed to store location");
                TaskStatus::FailedDb
            })
    }
}

#[async_trait]
impl EnrichmentTask for LocationTask {
    fn name(&self) -> &'static str {
        "location"
    }

    fn should_handle(&self, asset: &Asset) -> bool {
        asset.gps.is_some() && asset.place_id.is_none()
    }

    fn requires_content(&self, _asset: &Asset) -> bool {
        false
    }

    #[tracing::instrument(skip_all, fields(asset.id = asset.id))]
    async fn process(
        &self,
        asset: &mut Asset,
        _storage: Option<Arc<dyn StorageProvider>>,
    ) -> TaskOutcome {
        let Some(point) = asset.gps else {
            return TaskStatus::Skipped.into();
        };

        let place_id = match self.resolve_place(asset.id, point).await {
            Ok(id) => id,
            Err(status) => return status.into(),
        };

        asset.place_id = Some(place_id);
        if let Err(e) = self.assets.save_enrichment(asset).await {
            tracing::warn!(error = %e, "Failed to save resolved place");
            return TaskStatus::FailedDb.into();
        }

        tracing::info!(place.id = place_id, "Asset location resolved");
        TaskStatus::Done.into()
    }
}
