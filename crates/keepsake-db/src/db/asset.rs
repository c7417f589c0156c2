//! Asset repository: pipeline candidate selection, eager loading with bucket and
//! owner, and enrichment column writes.

use chrono::{DateTime, Utc};
use keepsake_core::models::{Asset, Bucket, GeoPoint, Owner, Thumbnail, UserPreferences};
use keepsake_core::{AppError, StorageBackend};
use sqlx::{PgPool, Postgres};
use std::time::Duration;
use uuid::Uuid;

/// Row type for an asset joined with its bucket and owner.
#[derive(Debug, sqlx::FromRow)]
pub struct AssetRow {
    pub id: i64,
    pub user_id: Uuid,
    pub bucket_id: i64,
    pub path: String,
    pub name: String,
    pub mime_type: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration_secs: Option<i32>,
    pub gps_latitude: Option<f64>,
    pub gps_longitude: Option<f64>,
    pub place_id: Option<i64>,
    pub size: i64,
    pub thumb_path: Option<String>,
    pub thumb_width: Option<i32>,
    pub thumb_height: Option<i32>,
    pub thumb_size: i64,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub bucket_name: String,
    pub backend: StorageBackend,
    pub local_path: Option<String>,
    pub base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub skip_video_conversion: bool,
}

impl AssetRow {
    pub fn to_asset(self) -> Asset {
        let gps = match (self.gps_latitude, self.gps_longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        };

        // A thumbnail only counts when every derived column is present.
        let thumbnail = match (self.thumb_path, self.thumb_width, self.thumb_height) {
            (Some(path), Some(width), Some(height)) if self.thumb_size > 0 && !path.is_empty() => {
                Some(Thumbnail {
                    path,
                    width,
                    height,
                    size: self.thumb_size,
                })
            }
            _ => None,
        };

        Asset {
            id: self.id,
            owner: Owner {
                id: self.user_id,
                preferences: UserPreferences {
                    skip_video_conversion: self.skip_video_conversion,
                },
            },
            bucket: Bucket {
                id: self.bucket_id,
                name: self.bucket_name,
                backend: self.backend,
                local_path: self.local_path,
                base_url: self.base_url,
                s3_bucket: self.s3_bucket,
                s3_region: self.s3_region,
                s3_endpoint: self.s3_endpoint,
            },
            path: self.path,
            name: self.name,
            mime_type: self.mime_type,
            width: self.width,
            height: self.height,
            duration_secs: self.duration_secs,
            gps,
            place_id: self.place_id,
            size: self.size,
            thumbnail,
            deleted: self.deleted,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Repository for the assets table.
#[derive(Clone)]
pub struct AssetRepository {
    pool: PgPool,
}

impl AssetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Ids of assets that still have at least one registered task without a
    /// recorded status, oldest first.
    #[tracing::instrument(skip(self, task_names), fields(db.table = "assets", tasks = task_names.len()))]
    pub async fn candidate_ids(
        &self,
        task_names: &[String],
        debounce: Duration,
    ) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar::<Postgres, i64>(
            r#"
            SELECT a.id
            FROM assets a
            LEFT JOIN asset_processing_status s ON s.asset_id = a.id
            WHERE a.deleted = FALSE
              AND a.size > 0
              AND a.updated_at < NOW() - make_interval(secs => $2)
              AND (s.asset_id IS NULL OR NOT (s.recorded_tasks @> $1::text[]))
            ORDER BY a.id ASC
            "#,
        )
        .bind(task_names)
        .bind(debounce.as_secs_f64())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Load an asset with its bucket and owner.
    #[tracing::instrument(skip(self), fields(db.table = "assets", db.record_id = id))]
    pub async fn get_with_relations(&self, id: i64) -> Result<Option<Asset>, AppError> {
        let row: Option<AssetRow> = sqlx::query_as::<Postgres, AssetRow>(
            r#"
            SELECT a.id, a.user_id, a.bucket_id, a.path, a.name, a.mime_type,
                   a.width, a.height, a.duration_secs, a.gps_latitude, a.gps_longitude,
                   a.place_id, a.size, a.thumb_path, a.thumb_width, a.thumb_height,
                   a.thumb_size, a.deleted, a.created_at, a.updated_at,
                   b.name AS bucket_name, b.backend, b.local_path, b.base_url,
                   b.s3_bucket, b.s3_region, b.s3_endpoint,
                   u.skip_video_conversion
            FROM assets a
            JOIN buckets b ON b.id = a.bucket_id
            JOIN users u ON u.id = a.user_id
            WHERE a.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(AssetRow::to_asset))
    }

    /// Write every column the enrichment pipeline owns.
    #[tracing::instrument(skip(self, asset), fields(db.table = "assets", db.record_id = asset.id))]
    pub async fn update_enrichment(&self, asset: &Asset) -> Result<(), AppError> {
        let thumbnail = asset.thumbnail.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE assets
            SET path = $2,
                name = $3,
                mime_type = $4,
                size = $5,
                width = $6,
                height = $7,
                duration_secs = $8,
                gps_latitude = $9,
                gps_longitude = $10,
                place_id = $11,
                thumb_path = $12,
                thumb_width = $13,
                thumb_height = $14,
                thumb_size = $15,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(asset.id)
        .bind(&asset.path)
        .bind(&asset.name)
        .bind(&asset.mime_type)
        .bind(asset.size)
        .bind(asset.width)
        .bind(asset.height)
        .bind(asset.duration_secs)
        .bind(asset.gps.map(|p| p.latitude))
        .bind(asset.gps.map(|p| p.longitude))
        .bind(asset.place_id)
        .bind(thumbnail.map(|t| t.path.clone()))
        .bind(thumbnail.map(|t| t.width))
        .bind(thumbnail.map(|t| t.height))
        .bind(thumbnail.map(|t| t.size).unwrap_or(0))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("asset {}", asset.id)));
        }
        Ok(())
    }
}
