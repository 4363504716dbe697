//! Schema bootstrap for the users and refresh_tokens tables
//!
//! Statements are idempotent and run at startup.

use sqlx::MySqlPool;

use crate::InfrastructureError;

pub(crate) const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        username VARCHAR(64) NOT NULL,
        password_hash VARCHAR(255) NOT NULL,
        created_at DATETIME(6) NOT NULL,
        UNIQUE KEY uq_users_username (username)
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

pub(crate) const CREATE_REFRESH_TOKENS: &str = r#"
    CREATE TABLE IF NOT EXISTS refresh_tokens (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        user_id BIGINT NOT NULL,
        token_hash CHAR(64) NOT NULL,
        created_at DATETIME(6) NOT NULL,
        expires_at DATETIME(6) NOT NULL,
        revoked BOOLEAN NOT NULL DEFAULT FALSE,
        replaced_by BIGINT NULL,
        device_info VARCHAR(255) NULL,
        UNIQUE KEY uq_refresh_tokens_token_hash (token_hash),
        KEY idx_refresh_tokens_user_id (user_id),
        KEY idx_refresh_tokens_expires_at (expires_at),
        CONSTRAINT fk_refresh_tokens_user FOREIGN KEY (user_id)
            REFERENCES users (id) ON DELETE CASCADE
    ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4
"#;

/// Creates the tables if they do not exist yet
pub async fn ensure_schema(pool: &MySqlPool) -> Result<(), InfrastructureError> {
    tracing::info!("Ensuring database schema");

    for statement in [CREATE_USERS, CREATE_REFRESH_TOKENS] {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database schema ready");
    Ok(())
}
