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

//! Diagnostic route handlers. Everything except `/healthz` answers
//! `404 DIAGNOSTICS_DISABLED` unless debug mode is on.

use axum::{extract::State, Json};
use jwt_cookie_bridge_types::{
    responses::{ClearResult, SettingsResponse, StatusResponse},
    APIResponse,
};

use crate::cookie::CookieContext;
use crate::error::AppError;
use crate::routes::events::clear_result;
use crate::state::AppState;

fn require_debug(state: &AppState) -> Result<(), AppError> {
    if state.handler.debug_mode() {
        Ok(())
    } else {
        Err(AppError::diagnostics_disabled())
    }
}

/// GET /status
pub async fn status(
    State(state): State<AppState>,
) -> Result<Json<APIResponse<StatusResponse>>, AppError> {
    require_debug(&state)?;
    let status = state.handler.get_last_status().await;
    Ok(Json(APIResponse::ok(StatusResponse { status })))
}

/// POST /status/reset
pub async fn reset(
    State(state): State<AppState>,
    mut cookies: CookieContext,
) -> Result<(CookieContext, Json<APIResponse<ClearResult>>), AppError> {
    require_debug(&state)?;
    let report = state.handler.reset(&mut cookies).await?;
    tracing::info!("Token cookie and status reset");
    Ok((cookies, Json(APIResponse::ok(clear_result(report, false)))))
}

/// GET /settings
pub async fn settings(
    State(state): State<AppState>,
) -> Result<Json<APIResponse<SettingsResponse>>, AppError> {
    require_debug(&state)?;
    let policy = state.handler.policy();
    Ok(Json(APIResponse::ok(SettingsResponse {
        cookie_name: policy.name.clone(),
        samesite_policy: policy.same_site.as_str().to_string(),
        http_only: policy.http_only,
        cookie_duration: policy.duration_secs,
        cookie_domain: policy.domain.clone(),
        allowed_domains: state.handler.domains().allowed().to_vec(),
        signature_verification: state.handler.verifies_signatures(),
    })))
}

/// GET /healthz
pub async fn healthz() -> &'static str {
    "ok"
}
