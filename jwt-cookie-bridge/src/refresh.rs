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

//! Refresh token hashing and per-user storage.
//!
//! Only an Argon2 hash ever reaches a store; the plaintext refresh token is
//! dropped as soon as it has been hashed.

use std::collections::HashMap;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum RefreshStoreError {
    #[error("refresh token hash error: {0}")]
    Hash(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One-way hash of a refresh token as a PHC string.
pub fn hash_refresh_token(refresh_token: &str) -> Result<String, RefreshStoreError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(refresh_token.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RefreshStoreError::Hash(e.to_string()))
}

/// Check `refresh_token` against a hash produced by [`hash_refresh_token`].
pub fn verify_refresh_token(refresh_token: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(refresh_token.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Per-user refresh token hash storage.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Replace any hash stored for `user_id`.
    async fn store(&self, user_id: &str, hash: &str) -> Result<(), RefreshStoreError>;

    async fn get(&self, user_id: &str) -> Result<Option<String>, RefreshStoreError>;

    /// Returns whether a hash was removed.
    async fn delete(&self, user_id: &str) -> Result<bool, RefreshStoreError>;
}

/// Process-local store, used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryRefreshTokenStore {
    hashes: RwLock<HashMap<String, String>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn store(&self, user_id: &str, hash: &str) -> Result<(), RefreshStoreError> {
        self.hashes
            .write()
            .await
            .insert(user_id.to_string(), hash.to_string());
        Ok(())
    }

    async fn get(&self, user_id: &str) -> Result<Option<String>, RefreshStoreError> {
        Ok(self.hashes.read().await.get(user_id).cloned())
    }

    async fn delete(&self, user_id: &str) -> Result<bool, RefreshStoreError> {
        Ok(self.hashes.write().await.remove(user_id).is_some())
    }
}
