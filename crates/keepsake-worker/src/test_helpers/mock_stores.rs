//! In-memory stand-in for every store trait
//!
//! One shared state backs all traits so candidate selection sees the status
//! rows the pipeline writes, the same way the SQL query does.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;
use keepsake_core::models::{
    Asset, CoordinateKey, Location, NewFace, NewLocation, Place, PlaceName,
};
use keepsake_core::TaskStatusMap;
use keepsake_db::{AssetStore, FaceStore, LocationStore, PlaceStore, StatusStore};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct State {
    assets: BTreeMap<i64, Asset>,
    status_payloads: HashMap<i64, String>,
    locations: Vec<Location>,
    places: Vec<Place>,
    faces: Vec<NewFace>,
    next_id: i64,
    asset_saves: usize,
    status_saves: usize,
    fail_asset_saves: bool,
    fail_status_loads: bool,
    fail_face_insert_at: Option<i32>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<State>>,
}

impl MockDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_asset(&self, asset: Asset) {
        self.state.lock().unwrap().assets.insert(asset.id, asset);
    }

    pub fn asset(&self, id: i64) -> Option<Asset> {
        self.state.lock().unwrap().assets.get(&id).cloned()
    }

    pub fn set_status_payload(&self, asset_id: i64, payload: &str) {
        self.state
            .lock()
            .unwrap()
            .status_payloads
            .insert(asset_id, payload.to_string());
    }

    pub fn status_payload(&self, asset_id: i64) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .status_payloads
            .get(&asset_id)
            .cloned()
    }

    pub fn seed_location(&self, key: CoordinateKey, name: PlaceName) -> Location {
        let mut state = self.state.lock().unwrap();
        let location = Location {
            id: state.next_id(),
            key,
            name,
            display_name: String::new(),
            place_id: None,
        };
        state.locations.push(location.clone());
        location
    }

    pub fn locations(&self) -> Vec<Location> {
        self.state.lock().unwrap().locations.clone()
    }

    pub fn places(&self) -> Vec<Place> {
        self.state.lock().unwrap().places.clone()
    }

    pub fn faces(&self) -> Vec<NewFace> {
        self.state.lock().unwrap().faces.clone()
    }

    pub fn asset_saves(&self) -> usize {
        self.state.lock().unwrap().asset_saves
    }

    pub fn status_saves(&self) -> usize {
        self.state.lock().unwrap().status_saves
    }

    pub fn fail_asset_saves(&self, fail: bool) {
        self.state.lock().unwrap().fail_asset_saves = fail;
    }

    pub fn fail_status_loads(&self, fail: bool) {
        self.state.lock().unwrap().fail_status_loads = fail;
    }

    /// Make the insert of the face with this sequence number fail.
    pub fn fail_face_insert_at(&self, seq: Option<i32>) {
        self.state.lock().unwrap().fail_face_insert_at = seq;
    }
}

#[async_trait]
impl AssetStore for MockDatabase {
    async fn candidate_ids(&self, task_names: &[String], debounce: Duration) -> Result<Vec<i64>> {
        let settled_before = Utc::now() - chrono::Duration::from_std(debounce)?;
        let state = self.state.lock().unwrap();
        Ok(state
            .assets
            .values()
            .filter(|a| !a.deleted && a.size > 0)
            .filter(|a| a.updated_at < settled_before)
            .filter(|a| match state.status_payloads.get(&a.id) {
                None => true,
                Some(payload) => {
                    let recorded = TaskStatusMap::decode(payload);
                    task_names.iter().any(|name| !recorded.contains(name))
                }
            })
            .map(|a| a.id)
            .collect())
    }

    async fn load(&self, id: i64) -> Result<Option<Asset>> {
        Ok(self.asset(id))
    }

    async fn save_enrichment(&self, asset: &Asset) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_asset_saves {
            return Err(anyhow!("connection reset by peer"));
        }
        if !state.assets.contains_key(&asset.id) {
            return Err(anyhow!("asset {} not found", asset.id));
        }
        state.asset_saves += 1;
        state.assets.insert(asset.id, asset.clone());
        Ok(())
    }
}

#[async_trait]
impl StatusStore for MockDatabase {
    async fn load(&self, asset_id: i64) -> Result<TaskStatusMap> {
        let state = self.state.lock().unwrap();
        if state.fail_status_loads {
            return Err(anyhow!("status table unavailable"));
        }
        Ok(state
            .status_payloads
            .get(&asset_id)
            .map(|p| TaskStatusMap::decode(p))
            .unwrap_or_default())
    }

    async fn save(&self, asset_id: i64, statuses: &TaskStatusMap) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.status_saves += 1;
        state.status_payloads.insert(asset_id, statuses.encode());
        Ok(())
    }
}

#[async_trait]
impl LocationStore for MockDatabase {
    async fn find_location(&self, key: CoordinateKey) -> Result<Option<Location>> {
        let state = self.state.lock().unwrap();
        Ok(state.locations.iter().find(|l| l.key == key).cloned())
    }

    async fn insert_location(&self, location: &NewLocation) -> Result<Location> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.locations.iter().find(|l| l.key == location.key) {
            return Ok(existing.clone());
        }
        let row = Location {
            id: state.next_id(),
            key: location.key,
            name: location.name.clone(),
            display_name: location.display_name.clone(),
            place_id: None,
        };
        state.locations.push(row.clone());
        Ok(row)
    }

    async fn link_place(&self, location_id: i64, place_id: i64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let location = state
            .locations
            .iter_mut()
            .find(|l| l.id == location_id)
            .ok_or_else(|| anyhow!("location {} not found", location_id))?;
        location.place_id = Some(place_id);
        Ok(())
    }
}

#[async_trait]
impl PlaceStore for MockDatabase {
    async fn find_or_create_place(&self, name: &PlaceName) -> Result<Place> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.places.iter().find(|p| &p.name == name) {
            return Ok(existing.clone());
        }
        let place = Place {
            id: state.next_id(),
            name: name.clone(),
        };
        state.places.push(place.clone());
        Ok(place)
    }
}

#[async_trait]
impl FaceStore for MockDatabase {
    async fn insert_face(&self, face: &NewFace) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_face_insert_at == Some(face.seq) {
            return Err(anyhow!("insert into faces failed"));
        }
        state.faces.push(face.clone());
        Ok(())
    }
}
