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

//! Event bodies delivered by the host platform.
//!
//! The host fires a login event after a successful OAuth/OIDC login and a
//! logout event when the session ends. Both are plain JSON so any platform
//! can deliver them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The host platform's view of the logged-in user.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user identifier; refresh token hashes are keyed by it.
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Request body for `POST /events/login`.
///
/// `token` is kept as raw JSON: the identity provider's token response is
/// untrusted input and its shape is checked by the event handler, not by
/// deserialization.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoginEventRequest {
    #[serde(default)]
    pub identity: Option<Identity>,

    #[serde(default)]
    pub token: Value,
}

/// Request body for `POST /events/logout`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogoutEventRequest {
    #[serde(default)]
    pub identity: Option<Identity>,
}
