// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use healthtrack::config::Config;
use healthtrack::routes::create_router;
use healthtrack::middleware::auth::verify_jwt;
use healthtrack::services::{AuthClient, ClientContext, FixedIncrement, ViewOptions};
use healthtrack::AppState;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_EMAIL: &str = "ada@example.org";
pub const TEST_PASSWORD: &str = "Str0ng!pass";

/// Create a test app backed by the mock auth service, with one registered
/// account and a step counter that adds 1 per tick.
#[allow(dead_code)]
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();
    create_test_app_with_config(config)
}

#[allow(dead_code)]
fn create_test_app_with_config(config: Config) -> (Router, Arc<AppState>) {
    let auth = AuthClient::new_mock();
    if let Some(directory) = auth.mock() {
        directory.add_account(TEST_EMAIL, TEST_PASSWORD);
    }

    let view_options = ViewOptions::new(config.steps_refresh_interval)
        .with_increments(Arc::new(FixedIncrement(1.0)));
    let state = Arc::new(AppState::with_view_options(config, auth, view_options));

    (create_router(state.clone()), state)
}

/// All `Set-Cookie` headers on a response.
#[allow(dead_code)]
pub fn set_cookie_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

#[allow(dead_code)]
pub fn find_cookie(headers: &[String], name: &str) -> String {
    headers
        .iter()
        .find(|value| value.starts_with(&format!("{name}=")))
        .cloned()
        .unwrap_or_else(|| panic!("missing Set-Cookie header for {name}: {headers:?}"))
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Request carrying the session cookie (`name=value`).
#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, cookie: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie);

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sign in the test account; returns the `name=value` part of the token
/// cookie.
#[allow(dead_code)]
pub async fn login(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/login",
            serde_json::json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD }),
        ))
        .await
        .unwrap();
    assert!(response.status().is_success(), "login failed: {}", response.status());

    let cookies = set_cookie_headers(&response);
    let cookie = find_cookie(&cookies, "healthtrack_token");
    cookie.split(';').next().unwrap().to_string()
}

/// Server-side context behind a token cookie.
#[allow(dead_code)]
pub fn client_for(state: &AppState, cookie: &str) -> Arc<ClientContext> {
    let client_id = verify_jwt(
        cookie.trim_start_matches("healthtrack_token="),
        &state.config.jwt_signing_key,
    )
    .expect("cookie should carry a valid token");
    state.clients.get(&client_id).expect("client should be registered")
}
