//! Processing status repository: one row per asset holding the encoded task
//! status payload plus the list of task names it records.

use keepsake_core::{AppError, TaskStatusMap};
use sqlx::{PgPool, Postgres};

#[derive(Clone)]
pub struct ProcessingStatusRepository {
    pool: PgPool,
}

impl ProcessingStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load and decode the status map of an asset. `None` when no pass has run yet.
    #[tracing::instrument(skip(self), fields(db.table = "asset_processing_status", db.record_id = asset_id))]
    pub async fn get(&self, asset_id: i64) -> Result<Option<TaskStatusMap>, AppError> {
        let payload: Option<String> = sqlx::query_scalar::<Postgres, String>(
            "SELECT payload FROM asset_processing_status WHERE asset_id = $1",
        )
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(payload.map(|p| TaskStatusMap::decode(&p)))
    }

    /// Insert or replace the status row of an asset.
    #[tracing::instrument(skip(self, statuses), fields(db.table = "asset_processing_status", db.record_id = asset_id))]
    pub async fn upsert(&self, asset_id: i64, statuses: &TaskStatusMap) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO asset_processing_status (asset_id, payload, recorded_tasks)
            VALUES ($1, $2, $3)
            ON CONFLICT (asset_id) DO UPDATE
            SET payload = EXCLUDED.payload,
                recorded_tasks = EXCLUDED.recorded_tasks,
                updated_at = NOW()
            "#,
        )
        .bind(asset_id)
        .bind(statuses.encode())
        .bind(statuses.task_names())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
