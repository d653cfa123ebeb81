use cook_core::model::{CookingUpdate, User, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, image_to_column, map_user_row, ser};
use crate::repository::{ProfileUpdate, StorageError, UserRepository};

impl SqliteRepository {
    async fn load_user(
        &self,
        executor: &mut sqlx::SqliteConnection,
        id: &UserId,
    ) -> Result<Option<User>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, username, email, photo_ref, created_at
            FROM users WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&mut *executor)
        .await
        .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let cooking_rows = sqlx::query(
            r"
            SELECT recipe_id FROM user_cooking
            WHERE user_id = ?1
            ORDER BY recipe_id ASC
            ",
        )
        .bind(id.as_str())
        .fetch_all(&mut *executor)
        .await
        .map_err(conn)?;

        let mut cooking = Vec::with_capacity(cooking_rows.len());
        for r in &cooking_rows {
            cooking.push(r.try_get::<String, _>("recipe_id").map_err(ser)?);
        }

        map_user_row(&row, cooking).map(Some)
    }
}

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn create_user(&self, user: &User) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO users (id, username, email, photo_ref, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO NOTHING
            ",
        )
        .bind(user.id().as_str())
        .bind(user.username())
        .bind(user.email())
        .bind(image_to_column(user.photo_ref()))
        .bind(user.created_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        for recipe in user.cooking().iter() {
            sqlx::query("INSERT OR IGNORE INTO user_cooking (user_id, recipe_id) VALUES (?1, ?2)")
                .bind(user.id().as_str())
                .bind(recipe.as_str())
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, StorageError> {
        let mut c = self.pool.acquire().await.map_err(conn)?;
        self.load_user(&mut c, id).await
    }

    async fn update_cooking(
        &self,
        id: &UserId,
        update: &CookingUpdate,
    ) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM users WHERE id = ?1")
            .bind(id.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let sql = match update {
            CookingUpdate::Add(_) => {
                "INSERT OR IGNORE INTO user_cooking (user_id, recipe_id) VALUES (?1, ?2)"
            }
            CookingUpdate::Remove(_) => {
                "DELETE FROM user_cooking WHERE user_id = ?1 AND recipe_id = ?2"
            }
        };
        sqlx::query(sql)
            .bind(id.as_str())
            .bind(update.recipe().as_str())
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<User, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let mut user = self
            .load_user(&mut tx, id)
            .await?
            .ok_or(StorageError::NotFound)?;
        if let Some(name) = &update.username {
            user.rename(name.as_str()).map_err(ser)?;
        }
        if let Some(photo) = &update.photo_ref {
            user.set_photo(Some(photo.clone()));
        }

        sqlx::query("UPDATE users SET username = ?2, photo_ref = ?3 WHERE id = ?1")
            .bind(id.as_str())
            .bind(user.username())
            .bind(image_to_column(user.photo_ref()))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(user)
    }
}
