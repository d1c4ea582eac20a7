/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Refresh token hash queries.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::refresh::{RefreshStoreError, RefreshTokenStore};

/// Refresh token hashes in the `refresh_tokens` table, one row per user.
#[derive(Debug, Clone)]
pub struct PgRefreshTokenStore {
    pool: PgPool,
}

impl PgRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the table if it does not exist yet.
    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS refresh_tokens (
                user_id TEXT PRIMARY KEY,
                token_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenStore for PgRefreshTokenStore {
    async fn store(&self, user_id: &str, hash: &str) -> Result<(), RefreshStoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, created_at)
            VALUES ($1, $2, CURRENT_TIMESTAMP)
            ON CONFLICT (user_id)
            DO UPDATE SET token_hash = $2, created_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(user_id)
        .bind(hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<String>, RefreshStoreError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT token_hash FROM refresh_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(hash)
    }

    async fn delete(&self, user_id: &str) -> Result<bool, RefreshStoreError> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
