//! MySQL implementation of the TokenRepository trait.
//!
//! Refresh tokens are stored by digest only. Rotation runs the insert and the
//! conditional revoke in one transaction, so two requests presenting the same
//! token cannot both succeed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};

use authn_core::domain::entities::token::{NewRefreshToken, RefreshToken};
use authn_core::errors::DomainError;
use authn_core::repositories::{Rotation, TokenRepository};

use super::{column_error, is_unique_violation, storage_error, to_id};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, token_hash, created_at, expires_at, revoked, replaced_by, device_info
    FROM refresh_tokens
"#;

const INSERT_TOKEN: &str = r#"
    INSERT INTO refresh_tokens (
        user_id, token_hash, created_at, expires_at, revoked, device_info
    ) VALUES (?, ?, ?, ?, FALSE, ?)
"#;

const MARK_REVOKED: &str = r#"
    UPDATE refresh_tokens
    SET revoked = TRUE, replaced_by = ?
    WHERE id = ? AND revoked = FALSE
"#;

const MARK_ROTATED: &str = r#"
    UPDATE refresh_tokens
    SET revoked = TRUE, replaced_by = ?
    WHERE id = ? AND revoked = FALSE AND expires_at > ?
"#;

/// MySQL implementation of TokenRepository
pub struct MySqlTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlTokenRepository {
    /// Create a new MySQL token repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshToken entity
    fn row_to_token(row: &MySqlRow) -> Result<RefreshToken, DomainError> {
        Ok(RefreshToken {
            id: row.try_get("id").map_err(|e| column_error("id", e))?,
            user_id: row.try_get("user_id").map_err(|e| column_error("user_id", e))?,
            token_hash: row
                .try_get("token_hash")
                .map_err(|e| column_error("token_hash", e))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| column_error("created_at", e))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| column_error("expires_at", e))?,
            revoked: row.try_get("revoked").map_err(|e| column_error("revoked", e))?,
            replaced_by: row
                .try_get("replaced_by")
                .map_err(|e| column_error("replaced_by", e))?,
            device_info: row
                .try_get("device_info")
                .map_err(|e| column_error("device_info", e))?,
        })
    }

    async fn insert_in(
        tx: &mut Transaction<'_, MySql>,
        token: &NewRefreshToken,
    ) -> Result<i64, DomainError> {
        let result = sqlx::query(INSERT_TOKEN)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(Utc::now())
            .bind(token.expires_at)
            .bind(&token.device_info)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_error("Failed to insert replacement token", e))?;

        to_id(result.last_insert_id())
    }
}

#[async_trait]
impl TokenRepository for MySqlTokenRepository {
    async fn insert(&self, token: NewRefreshToken) -> Result<i64, DomainError> {
        let result = sqlx::query(INSERT_TOKEN)
            .bind(token.user_id)
            .bind(&token.token_hash)
            .bind(Utc::now())
            .bind(token.expires_at)
            .bind(&token.device_info)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DomainError::Validation {
                        message: "Token hash already exists".to_string(),
                    }
                } else {
                    storage_error("Failed to save refresh token", e)
                }
            })?;

        to_id(result.last_insert_id())
    }

    async fn lookup_by_hash(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let query = format!("{} WHERE token_hash = ? LIMIT 1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to find refresh token", e))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<RefreshToken>, DomainError> {
        let query = format!("{} WHERE id = ?", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to find refresh token by id", e))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn mark_revoked(&self, id: i64, replaced_by: Option<i64>) -> Result<bool, DomainError> {
        let result = sqlx::query(MARK_REVOKED)
            .bind(replaced_by)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to revoke refresh token", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_all(&self, user_id: i64) -> Result<usize, DomainError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = ? AND revoked = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("Failed to revoke user tokens", e))?;

        Ok(result.rows_affected() as usize)
    }

    async fn delete_expired(&self, before: DateTime<Utc>) -> Result<usize, DomainError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < ?")
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_error("Failed to delete expired tokens", e))?;

        Ok(result.rows_affected() as usize)
    }

    async fn rotate(
        &self,
        current_id: i64,
        successor: NewRefreshToken,
    ) -> Result<Rotation, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("Failed to begin rotation", e))?;

        let new_id = Self::insert_in(&mut tx, &successor).await?;

        // Row lock on the current record; a concurrent rotation waits here and
        // then sees revoked = TRUE
        let updated = sqlx::query(MARK_ROTATED)
            .bind(new_id)
            .bind(current_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_error("Failed to mark rotated token", e))?;

        if updated.rows_affected() == 0 {
            // Unrevoked here means the expiry guard failed
            let revoked: Option<bool> =
                sqlx::query_scalar("SELECT revoked FROM refresh_tokens WHERE id = ?")
                    .bind(current_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| storage_error("Failed to read rotated token", e))?;

            tx.rollback()
                .await
                .map_err(|e| storage_error("Failed to roll back rotation", e))?;

            return Ok(match revoked {
                Some(false) => Rotation::Expired,
                _ => Rotation::AlreadyConsumed,
            });
        }

        tx.commit()
            .await
            .map_err(|e| storage_error("Failed to commit rotation", e))?;

        Ok(Rotation::Rotated { new_id })
    }
}
