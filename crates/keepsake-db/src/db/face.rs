use keepsake_core::models::NewFace;
use keepsake_core::AppError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres};

/// Repository for faces table.
#[derive(Clone)]
pub struct FaceRepository {
    pool: PgPool,
}

impl FaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, face), fields(db.table = "faces", asset.id = face.asset_id, seq = face.seq))]
    pub async fn insert(&self, face: &NewFace) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar::<Postgres, i64>(
            r#"
            INSERT INTO faces (asset_id, seq, bounding_box, encoding)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(face.asset_id)
        .bind(face.seq)
        .bind(Json(&face.bounding_box))
        .bind(Json(&face.encoding))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}
