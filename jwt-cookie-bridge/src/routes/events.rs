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

//! Identity provider event handlers: login, logout, current token.
//!
//! A login event carries the provider's token payload. When the token passes
//! every check it is written to the browser as a `Secure` cookie; a rejected
//! event still answers `200 OK` with `cookie_set: false` so the provider's
//! login flow is never interrupted.

use axum::{body::Bytes, extract::State, Json};
use jwt_cookie_bridge_types::{
    requests::{LoginEventRequest, LogoutEventRequest},
    responses::{ClearResult, LoginResult, TokenResponse},
    APIResponse, Identity,
};
use serde_json::Value;

use crate::cookie::{ClearReport, CookieContext};
use crate::handler::LogoutOutcome;
use crate::state::AppState;

/// POST /events/login
///
/// Any body is accepted. A body that is not JSON, or an identity that does
/// not deserialize, reaches the handler as missing input.
pub async fn login(
    State(state): State<AppState>,
    mut cookies: CookieContext,
    body: Bytes,
) -> (CookieContext, Json<APIResponse<LoginResult>>) {
    let event = parse_login_event(&body);
    let outcome = state
        .handler
        .on_login(event.identity.as_ref(), &event.token, &mut cookies)
        .await;

    let result = LoginResult {
        cookie_set: outcome.cookie_set(),
        rejection: outcome.rejection().map(|r| r.reason().to_string()),
        refresh_token_stored: outcome.refresh_token_stored,
    };
    (cookies, Json(APIResponse::ok(result)))
}

/// POST /events/logout
///
/// The body is optional. Without an identity the cookie is still cleared but
/// no refresh token is deleted.
pub async fn logout(
    State(state): State<AppState>,
    mut cookies: CookieContext,
    body: Bytes,
) -> (CookieContext, Json<APIResponse<ClearResult>>) {
    let request: LogoutEventRequest = if body.is_empty() {
        LogoutEventRequest::default()
    } else {
        serde_json::from_slice(&body).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed logout body: {e}");
            LogoutEventRequest::default()
        })
    };

    let outcome = state
        .handler
        .on_logout(request.identity.as_ref(), &mut cookies)
        .await;
    (cookies, Json(APIResponse::ok(logout_result(outcome))))
}

/// GET /token
///
/// Returns the bridged token from the request's cookies. A malformed cookie
/// is cleared and reported as absent.
pub async fn current_token(
    State(state): State<AppState>,
    mut cookies: CookieContext,
) -> (CookieContext, Json<APIResponse<TokenResponse>>) {
    let token = state.handler.get_current_token(&mut cookies);
    (cookies, Json(APIResponse::ok(TokenResponse { token })))
}

pub(crate) fn clear_result(report: ClearReport, refresh_token_deleted: bool) -> ClearResult {
    ClearResult {
        cleared_paths: report.cleared.iter().map(|p| p.to_string()).collect(),
        failed_paths: report.failed.iter().map(|p| p.to_string()).collect(),
        refresh_token_deleted,
    }
}

fn parse_login_event(body: &[u8]) -> LoginEventRequest {
    let mut value: Value = serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::warn!("Login event body is not JSON: {e}");
        Value::Null
    });

    let identity = value
        .get_mut("identity")
        .map(Value::take)
        .filter(|raw| !raw.is_null())
        .and_then(|raw| match serde_json::from_value::<Identity>(raw) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!("Ignoring malformed login identity: {e}");
                None
            }
        });
    let token = value.get_mut("token").map(Value::take).unwrap_or_default();

    LoginEventRequest { identity, token }
}

/// A clear that failed outright reports every path as failed.
fn logout_result(outcome: LogoutOutcome) -> ClearResult {
    let LogoutOutcome {
        clear_report,
        refresh_token_deleted,
    } = outcome;
    clear_result(
        clear_report.unwrap_or_else(ClearReport::all_failed),
        refresh_token_deleted,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::CLEAR_PATHS;

    #[test]
    fn login_event_with_valid_identity_is_parsed() {
        let event = parse_login_event(
            br#"{"identity":{"user_id":"42","email":"a@example.edu"},"token":{"access_token":"x"}}"#,
        );
        assert_eq!(event.identity.map(|i| i.user_id), Some("42".to_string()));
        assert_eq!(event.token["access_token"], "x");
    }

    #[test]
    fn malformed_identity_is_dropped_but_token_kept() {
        let event = parse_login_event(br#"{"identity":{"user_id":42},"token":{"access_token":"x"}}"#);
        assert!(event.identity.is_none());
        assert_eq!(event.token["access_token"], "x");

        let event = parse_login_event(br#"{"identity":"bob","token":{}}"#);
        assert!(event.identity.is_none());
    }

    #[test]
    fn unparseable_body_yields_empty_event() {
        let bodies: [&[u8]; 4] = [b"", b"not json", b"[1,2]", b"null"];
        for body in bodies {
            let event = parse_login_event(body);
            assert!(event.identity.is_none());
            assert_eq!(event.token, Value::Null);
        }
    }

    #[test]
    fn failed_clear_reports_every_path_as_failed() {
        let result = logout_result(LogoutOutcome {
            clear_report: None,
            refresh_token_deleted: true,
        });
        assert!(result.cleared_paths.is_empty());
        assert_eq!(result.failed_paths, CLEAR_PATHS.to_vec());
        assert!(result.refresh_token_deleted);
    }
}
