//! Asset model: a backed-up photo or video plus the fields the enrichment
//! pipeline fills in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::storage_types::StorageBackend;

/// A GPS coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Derived thumbnail fields. Either all of them are recorded or none are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub path: String,
    pub width: i32,
    pub height: i32,
    pub size: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// User opted out of server-side video conversion.
    pub skip_video_conversion: bool,
}

/// The user owning an asset, with the preferences tasks consult.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: Uuid,
    pub preferences: UserPreferences,
}

/// A configured storage location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: i64,
    pub name: String,
    pub backend: StorageBackend,
    /// Root directory for local buckets.
    pub local_path: Option<String>,
    /// Base URL local files are served from.
    pub base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub owner: Owner,
    pub bucket: Bucket,
    /// Storage key of the primary file inside its bucket.
    pub path: String,
    pub name: String,
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    /// Whole seconds, rounded up.
    pub duration_secs: Option<i32>,
    pub gps: Option<GeoPoint>,
    pub place_id: Option<i64>,
    pub size: i64,
    pub thumbnail: Option<Thumbnail>,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Asset {
    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn dimensions_unknown(&self) -> bool {
        self.width.is_none() || self.height.is_none()
    }
}
