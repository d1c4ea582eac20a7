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

//! Shared application state passed to every Axum handler via `State`.

use std::sync::Arc;

use crate::config::BridgeSettings;
use crate::handler::SsoEventHandler;
use crate::refresh::RefreshTokenStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<SsoEventHandler>,
}

impl AppState {
    pub fn new(settings: &BridgeSettings, refresh_tokens: Arc<dyn RefreshTokenStore>) -> Self {
        Self {
            handler: Arc::new(SsoEventHandler::new(settings, refresh_tokens)),
        }
    }
}
