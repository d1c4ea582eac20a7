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

//! Integration tests for the diagnostic routes.


use axum::body::Body;
use axum::http::{Request, StatusCode};
use jwt_cookie_bridge::config::BridgeSettings;
use jwt_cookie_bridge_types::responses::{ClearResult, SettingsResponse, StatusResponse};
use jwt_cookie_bridge_types::{APIError, APIResponse};
use serde_json::json;
use test_helpers::*;
use tower::ServiceExt;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_diagnostics_hidden_without_debug_mode() {
    let settings = BridgeSettings {
        debug_mode: false,
        ..debug_settings()
    };
    let (app, _) = build_app(&settings);

    for req in [
        get("/status"),
        get("/settings"),
        Request::builder()
            .method("POST")
            .uri("/status/reset")
            .body(Body::empty())
            .unwrap(),
    ] {
        let resp = app.clone().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: APIResponse<APIError> = response_json(resp).await;
        assert!(!body.success);
        assert_eq!(body.result.code, "DIAGNOSTICS_DISABLED");
    }
}

#[tokio::test]
async fn test_status_is_empty_before_any_login() {
    let (app, _) = build_app(&debug_settings());

    let resp = app.oneshot(get("/status")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: APIResponse<StatusResponse> = response_json(resp).await;
    assert_eq!(body.result.status, None);
}

#[tokio::test]
async fn test_status_records_successful_login() {
    let (app, _) = build_app(&debug_settings());

    app.clone()
        .oneshot(json_request(
            "/events/login",
            &login_body(json!({ "access_token": mint_token(3600) })),
        ))
        .await
        .unwrap();

    let resp = app.oneshot(get("/status")).await.unwrap();
    let body: APIResponse<StatusResponse> = response_json(resp).await;
    let status = body.result.status.expect("status recorded");
    assert!(status.hook_triggered);
    assert!(status.user_valid);
    assert!(status.token_received);
    assert!(status.token_valid);
    assert!(status.cookie_set);
    assert!(status.timestamp > 0);
}

#[tokio::test]
async fn test_status_records_rejected_login() {
    let (app, _) = build_app(&debug_settings());

    app.clone()
        .oneshot(json_request(
            "/events/login",
            &login_body(json!({ "access_token": mint_token(-3600) })),
        ))
        .await
        .unwrap();

    let resp = app.oneshot(get("/status")).await.unwrap();
    let body: APIResponse<StatusResponse> = response_json(resp).await;
    let status = body.result.status.expect("status recorded");
    assert!(status.hook_triggered);
    assert!(status.token_received);
    assert!(!status.token_valid);
    assert!(!status.cookie_set);
}

#[tokio::test]
async fn test_reset_clears_cookie_and_status() {
    let (app, _) = build_app(&debug_settings());

    app.clone()
        .oneshot(json_request(
            "/events/login",
            &login_body(json!({ "access_token": mint_token(3600) })),
        ))
        .await
        .unwrap();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/status/reset")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(set_cookies(&resp).len(), 4);
    let body: APIResponse<ClearResult> = response_json(resp).await;
    assert_eq!(body.result.cleared_paths.len(), 4);
    assert!(!body.result.refresh_token_deleted);

    let resp = app.oneshot(get("/status")).await.unwrap();
    let body: APIResponse<StatusResponse> = response_json(resp).await;
    assert_eq!(body.result.status, None);
}

#[tokio::test]
async fn test_settings_reports_effective_policy() {
    let settings = BridgeSettings {
        verify_secret: Some(TEST_IDP_SECRET.to_string()),
        ..debug_settings()
    };
    let (app, _) = build_app(&settings);

    let resp = app.oneshot(get("/settings")).await.unwrap();
    let body: APIResponse<SettingsResponse> = response_json(resp).await;
    assert_eq!(
        body.result,
        SettingsResponse {
            cookie_name: "mo_jwt".to_string(),
            samesite_policy: "Lax".to_string(),
            http_only: true,
            cookie_duration: 3600,
            cookie_domain: "sso.example.edu".to_string(),
            allowed_domains: vec!["example.edu".to_string()],
            signature_verification: true,
        }
    );
}

#[tokio::test]
async fn test_healthz_is_always_available() {
    let settings = BridgeSettings {
        debug_mode: false,
        ..debug_settings()
    };
    let (app, _) = build_app(&settings);

    let resp = app.oneshot(get("/healthz")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
