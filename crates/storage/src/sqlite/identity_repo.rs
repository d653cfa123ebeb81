use cook_core::model::UserId;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::credentials::PasswordHash;
use crate::repository::{Account, IdentityProvider, StorageError};

#[async_trait::async_trait]
impl IdentityProvider for SqliteRepository {
    async fn create_account(&self, email: &str, password: &str) -> Result<Account, StorageError> {
        let user_id = UserId::generate();
        let hash = PasswordHash::create(password)?;

        let res = sqlx::query(
            r"
            INSERT INTO credentials (user_id, email, password_hash)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(email) DO NOTHING
            ",
        )
        .bind(user_id.as_str())
        .bind(email)
        .bind(hash.as_str())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::Conflict);
        }

        Ok(Account {
            user_id,
            email: email.to_owned(),
        })
    }

    async fn verify(&self, email: &str, password: &str) -> Result<Option<Account>, StorageError> {
        let row = sqlx::query("SELECT user_id, password_hash FROM credentials WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let stored: String = row.try_get("password_hash").map_err(ser)?;
        let hash = PasswordHash::from_stored(stored);
        if !hash.verify(password) {
            return Ok(None);
        }

        let raw_id: String = row.try_get("user_id").map_err(ser)?;
        let user_id = UserId::new(raw_id).map_err(ser)?;
        Ok(Some(Account {
            user_id,
            email: email.to_owned(),
        }))
    }

    async fn delete_account(&self, account: &Account) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM credentials WHERE email = ?1 AND user_id = ?2")
            .bind(&account.email)
            .bind(account.user_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
