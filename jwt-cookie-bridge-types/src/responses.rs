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

//! Response types for the bridge's HTTP surface.
//!
//! Every endpoint returns an [`APIResponse<T>`] envelope:
//! - On success: `{ "success": true,  "result": <T> }`
//! - On failure: `{ "success": false, "result": <APIError> }`

use serde::{Deserialize, Serialize};

use crate::status::TokenStatus;

// ---------------------------------------------------------------------------
// Generic envelope
// ---------------------------------------------------------------------------

/// Top-level API response envelope.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct APIResponse<A: Serialize> {
    pub success: bool,
    pub result: A,
}

impl<A: Serialize> APIResponse<A> {
    /// Wrap a successful result.
    pub fn ok(result: A) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

impl APIResponse<crate::error::APIError> {
    /// Wrap an error result.
    pub fn error(err: crate::error::APIError) -> Self {
        Self {
            success: false,
            result: err,
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint-specific response payloads
// ---------------------------------------------------------------------------

/// Response payload for `POST /events/login`.
///
/// A rejected event is still a successful *request*: the host fired the
/// event and the bridge handled it. `cookie_set` tells whether the token was
/// bridged and `rejection` names the step that refused it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LoginResult {
    pub cookie_set: bool,
    /// One of `missing-input`, `bad-structure`, `bad-claims`, `bad-domain`,
    /// `write-failed`; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
    pub refresh_token_stored: bool,
}

/// Response payload for `POST /events/logout` and `POST /status/reset`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClearResult {
    /// Paths for which an expiry instruction was queued. `""` means the
    /// cookie was cleared without a `Path` attribute.
    pub cleared_paths: Vec<String>,
    pub failed_paths: Vec<String>,
    pub refresh_token_deleted: bool,
}

/// Response payload for `GET /token`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: Option<String>,
}

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StatusResponse {
    /// `None` when no event was recorded in the retention window.
    pub status: Option<TokenStatus>,
}

/// Response payload for `GET /settings`: the effective cookie policy.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SettingsResponse {
    pub cookie_name: String,
    pub samesite_policy: String,
    pub http_only: bool,
    pub cookie_duration: u64,
    pub cookie_domain: String,
    pub allowed_domains: Vec<String>,
    pub signature_verification: bool,
}
