//! Location and place repositories: the reverse-geocoding cache.

use keepsake_core::models::{CoordinateKey, Location, NewLocation, Place, PlaceName};
use keepsake_core::AppError;
use sqlx::{PgPool, Postgres};

/// Row type for locations table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
pub struct LocationRow {
    pub id: i64,
    pub lat_e4: i32,
    pub lon_e4: i32,
    pub area: String,
    pub city: String,
    pub country: String,
    pub display_name: String,
    pub place_id: Option<i64>,
}

impl LocationRow {
    pub fn to_location(self) -> Location {
        Location {
            id: self.id,
            key: CoordinateKey {
                lat_e4: self.lat_e4,
                lon_e4: self.lon_e4,
            },
            name: PlaceName {
                area: self.area,
                city: self.city,
                country: self.country,
            },
            display_name: self.display_name,
            place_id: self.place_id,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PlaceRow {
    pub id: i64,
    pub area: String,
    pub city: String,
    pub country: String,
}

impl PlaceRow {
    pub fn to_place(self) -> Place {
        Place {
            id: self.id,
            name: PlaceName {
                area: self.area,
                city: self.city,
                country: self.country,
            },
        }
    }
}

/// Repository for locations table.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self), fields(db.table = "locations"))]
    pub async fn find_by_key(&self, key: CoordinateKey) -> Result<Option<Location>, AppError> {
        let row: Option<LocationRow> = sqlx::query_as::<Postgres, LocationRow>(
            r#"
            SELECT id, lat_e4, lon_e4, area, city, country, display_name, place_id
            FROM locations
            WHERE lat_e4 = $1 AND lon_e4 = $2
            "#,
        )
        .bind(key.lat_e4)
        .bind(key.lon_e4)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(LocationRow::to_location))
    }

    /// Insert a location. A concurrent insert for the same key wins and its row is
    /// returned.
    #[tracing::instrument(skip(self, location), fields(db.table = "locations"))]
    pub async fn insert(&self, location: &NewLocation) -> Result<Location, AppError> {
        let row: LocationRow = sqlx::query_as::<Postgres, LocationRow>(
            r#"
            INSERT INTO locations (lat_e4, lon_e4, area, city, country, display_name)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (lat_e4, lon_e4) DO UPDATE SET lat_e4 = EXCLUDED.lat_e4
            RETURNING id, lat_e4, lon_e4, area, city, country, display_name, place_id
            "#,
        )
        .bind(location.key.lat_e4)
        .bind(location.key.lon_e4)
        .bind(&location.name.area)
        .bind(&location.name.city)
        .bind(&location.name.country)
        .bind(&location.display_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.to_location())
    }

    #[tracing::instrument(skip(self), fields(db.table = "locations", db.record_id = location_id))]
    pub async fn link_place(&self, location_id: i64, place_id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE locations SET place_id = $2 WHERE id = $1")
            .bind(location_id)
            .bind(place_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// Repository for places table.
#[derive(Clone)]
pub struct PlaceRepository {
    pool: PgPool,
}

impl PlaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Return the place with this (area, city, country), creating it on first sighting.
    #[tracing::instrument(skip(self, name), fields(db.table = "places"))]
    pub async fn find_or_create(&self, name: &PlaceName) -> Result<Place, AppError> {
        let row: PlaceRow = sqlx::query_as::<Postgres, PlaceRow>(
            r#"
            INSERT INTO places (area, city, country)
            VALUES ($1, $2, $3)
            ON CONFLICT (area, city, country) DO UPDATE SET area = EXCLUDED.area
            RETURNING id, area, city, country
            "#,
        )
        .bind(&name.area)
        .bind(&name.city)
        .bind(&name.country)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.to_place())
    }
}
