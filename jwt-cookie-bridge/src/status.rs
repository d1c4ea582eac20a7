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

//! Last-write-wins holder for the diagnostic [`TokenStatus`].

use std::time::Duration;

use jwt_cookie_bridge_types::TokenStatus;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// How long a recorded status stays readable.
pub const STATUS_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug)]
pub struct StatusStore {
    entry: RwLock<Option<(TokenStatus, Instant)>>,
    retention: Duration,
}

impl Default for StatusStore {
    fn default() -> Self {
        Self::new(STATUS_RETENTION)
    }
}

impl StatusStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            entry: RwLock::new(None),
            retention,
        }
    }

    /// Overwrite the stored snapshot.
    pub async fn record(&self, status: TokenStatus) {
        *self.entry.write().await = Some((status, Instant::now()));
    }

    /// The last snapshot, unless it has outlived the retention window.
    pub async fn last(&self) -> Option<TokenStatus> {
        let entry = self.entry.read().await;
        match *entry {
            Some((status, recorded)) if recorded.elapsed() < self.retention => Some(status),
            _ => None,
        }
    }

    pub async fn clear(&self) {
        *self.entry.write().await = None;
    }
}
