//! Test helpers for task and pipeline unit tests
//!
//! Mock stores, storage, external tools and fixtures, so the pipeline can be
//! exercised end to end without a database, a bucket or any installed utility.

pub mod mock_storage;
pub mod mock_stores;
pub mod mock_tools;

pub use mock_storage::{MockResolver, MockStorage};
pub use mock_stores::MockDatabase;
pub use mock_tools::{
    MockFaceEngine, MockFrameExtractor, MockGeocoder, MockProbe, MockTools, MockTranscoder,
    NamedTask,
};

use chrono::{TimeZone, Utc};
use keepsake_core::models::{Asset, BoundingBox, Bucket, Owner, UserPreferences};
use keepsake_core::StorageBackend;
use keepsake_processing::{Address, AddressParts, FaceDetection};
use keepsake_storage::SignedUrlCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::registry::{TaskDependencies, TaskRegistry};

pub fn sample_bucket() -> Bucket {
    Bucket {
        id: 1,
        name: "family-photos".to_string(),
        backend: StorageBackend::S3,
        local_path: None,
        base_url: None,
        s3_bucket: Some("keepsake-family".to_string()),
        s3_region: Some("eu-west-1".to_string()),
        s3_endpoint: None,
    }
}

/// A settled JPEG with no GPS, unknown dimensions and no thumbnail.
pub fn sample_asset(id: i64) -> Asset {
    let uploaded = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    Asset {
        id,
        owner: Owner {
            id: Uuid::nil(),
            preferences: UserPreferences::default(),
        },
        bucket: sample_bucket(),
        path: format!("photos/{}.jpg", id),
        name: format!("{}.jpg", id),
        mime_type: "image/jpeg".to_string(),
        width: None,
        height: None,
        duration_secs: None,
        gps: None,
        place_id: None,
        size: 2_048_576,
        thumbnail: None,
        deleted: false,
        created_at: uploaded,
        updated_at: uploaded,
    }
}

/// A QuickTime video that still needs normalization.
pub fn sample_video(id: i64) -> Asset {
    Asset {
        path: format!("videos/{}.mov", id),
        name: format!("{}.mov", id),
        mime_type: "video/quicktime".to_string(),
        ..sample_asset(id)
    }
}

pub fn paris_address() -> Address {
    Address {
        display_name: "Tour Eiffel, 5, Avenue Anatole France, Gros-Caillou, Paris, Île-de-France, France".to_string(),
        address: AddressParts {
            tourism: Some("Tour Eiffel".to_string()),
            road: Some("Avenue Anatole France".to_string()),
            suburb: Some("Gros-Caillou".to_string()),
            city: Some("Paris".to_string()),
            state: Some("Île-de-France".to_string()),
            country: Some("France".to_string()),
            ..Default::default()
        },
    }
}

pub fn two_faces() -> FaceDetection {
    FaceDetection {
        boxes: vec![
            BoundingBox {
                top: 40,
                right: 180,
                bottom: 160,
                left: 60,
            },
            BoundingBox {
                top: 52,
                right: 420,
                bottom: 170,
                left: 300,
            },
        ],
        encodings: vec![vec![0.12, -0.08, 0.33], vec![-0.41, 0.05, 0.27]],
    }
}

pub fn url_cache() -> Arc<SignedUrlCache> {
    Arc::new(SignedUrlCache::new(
        NonZeroUsize::new(16).unwrap(),
        Duration::from_secs(3600),
    ))
}

/// The production task list wired to mocks.
pub fn standard_registry(db: &MockDatabase, tools: &MockTools) -> TaskRegistry {
    TaskRegistry::standard(TaskDependencies {
        assets: Arc::new(db.clone()),
        locations: Arc::new(db.clone()),
        places: Arc::new(db.clone()),
        faces: Arc::new(db.clone()),
        geocoder: tools.geocoder.clone(),
        probe: tools.probe.clone(),
        transcoder: tools.transcoder.clone(),
        frames: tools.frames.clone(),
        face_engine: tools.face_engine.clone(),
        url_cache: tools.url_cache.clone(),
        thumbnail_max_width: 720,
    })
    .unwrap()
}
