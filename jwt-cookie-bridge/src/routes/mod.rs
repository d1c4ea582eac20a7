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

//! Axum router configuration for the token cookie bridge.

pub mod diagnostics;
pub mod events;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Build the full application router.
pub fn router() -> Router<AppState> {
    Router::new()
        // Identity provider events
        .route("/events/login", post(events::login))
        .route("/events/logout", post(events::logout))
        .route("/token", get(events::current_token))
        // Diagnostics (debug mode only)
        .route("/status", get(diagnostics::status))
        .route("/status/reset", post(diagnostics::reset))
        .route("/settings", get(diagnostics::settings))
        .route("/healthz", get(diagnostics::healthz))
}
