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

//! Diagnostic snapshot of the most recent login event.

use serde::{Deserialize, Serialize};

/// Progress flags for one login event, as shown on the operator dashboard.
///
/// Only recorded while debug mode is on. Each event overwrites the previous
/// snapshot. This record is diagnostic only and plays no part in deciding
/// whether a cookie is set.
///
/// # Example payload
///
/// ```json
/// {
///   "timestamp": 1707004800,
///   "hook_triggered": true,
///   "user_valid": true,
///   "token_received": true,
///   "token_valid": false,
///   "cookie_set": false
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct TokenStatus {
    /// Unix timestamp in seconds when the event started.
    pub timestamp: i64,
    pub hook_triggered: bool,
    pub user_valid: bool,
    pub token_received: bool,
    pub token_valid: bool,
    pub cookie_set: bool,
}

impl TokenStatus {
    /// A fresh snapshot for an event that has just fired.
    pub fn started(timestamp: i64) -> Self {
        Self {
            timestamp,
            hook_triggered: true,
            ..Self::default()
        }
    }
}
