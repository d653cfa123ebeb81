use cook_core::model::Supermarket;

use super::SqliteRepository;
use super::mapping::{conn, map_supermarket_row};
use crate::repository::{StorageError, SupermarketRepository};

#[async_trait::async_trait]
impl SupermarketRepository for SqliteRepository {
    async fn upsert_supermarket(&self, supermarket: &Supermarket) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO supermarkets (id, name, location, latitude, longitude)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                location = excluded.location,
                latitude = excluded.latitude,
                longitude = excluded.longitude
            ",
        )
        .bind(supermarket.id.as_str())
        .bind(supermarket.name.as_str())
        .bind(supermarket.location.as_str())
        .bind(supermarket.geopoint.latitude())
        .bind(supermarket.geopoint.longitude())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn list_supermarkets(&self) -> Result<Vec<Supermarket>, StorageError> {
        let rows = sqlx::query("SELECT id, name, location, latitude, longitude FROM supermarkets")
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

        let mut markets = Vec::with_capacity(rows.len());
        for row in &rows {
            markets.push(map_supermarket_row(row)?);
        }
        Ok(markets)
    }
}
