// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard mounting and the health data entry form.

use axum::http::StatusCode;
use healthtrack::time_utils::{format_long_date, today_utc};
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

mod common;

async fn form_status(app: &axum::Router, cookie: &str) -> String {
    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/dashboard", cookie, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    body["formStatus"].as_str().unwrap().to_string()
}

async fn toggle(app: &axum::Router, cookie: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/dashboard/form/toggle",
            cookie,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    common::body_json(response).await
}

#[tokio::test]
async fn test_dashboard_initial_render() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;

    let response = app
        .oneshot(common::authed_request("GET", "/api/dashboard", &cookie, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["formStatus"], "formClosed");
    assert_eq!(body["refreshing"], true);

    let cards = body["cards"].as_array().unwrap();
    assert_eq!(cards.len(), 4);
    assert_eq!(cards[0]["value"], "8,432");
    assert_eq!(cards[0]["progress"], 84);
    assert_eq!(cards[1]["caption"], "Normal range: 60-100 BPM");
    assert!(cards[1].get("progress").is_none());
}

#[tokio::test]
async fn test_toggle_twice_returns_to_closed() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;

    assert_eq!(toggle(&app, &cookie).await["formStatus"], "formOpen");
    assert_eq!(toggle(&app, &cookie).await["formStatus"], "formClosed");
    assert_eq!(form_status(&app, &cookie).await, "formClosed");
}

#[tokio::test]
async fn test_cancel_closes_form() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;
    toggle(&app, &cookie).await;

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/dashboard/form/cancel",
            &cookie,
            None,
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["formStatus"], "formClosed");
}

#[tokio::test]
async fn test_submit_out_of_range_keeps_form_open() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;
    toggle(&app, &cookie).await;

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/dashboard/form",
            &cookie,
            Some(json!({ "heartRate": 250 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::body_json(response).await;
    assert!(body["fields"].get("heart_rate").is_some());

    assert_eq!(form_status(&app, &cookie).await, "formOpen");
}

#[tokio::test]
async fn test_submit_future_date_rejected() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;
    toggle(&app, &cookie).await;

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/dashboard/form",
            &cookie,
            Some(json!({ "date": "2999-01-01", "steps": 100 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = common::body_json(response).await;
    assert!(body["fields"].get("date").is_some());
}

#[tokio::test]
async fn test_valid_submit_acknowledges_and_closes() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;
    toggle(&app, &cookie).await;

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/dashboard/form",
            &cookie,
            Some(json!({ "steps": 12000, "sleepHours": 7, "waterIntake": 2000 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["formStatus"], "formClosed");
    assert_eq!(body["notice"]["kind"], "success");
    assert_eq!(
        body["notice"]["title"],
        format!("Data for {} has been recorded.", format_long_date(today_utc()))
    );

    // Entries are acknowledged, not applied to the cards
    let response = app
        .oneshot(common::authed_request("GET", "/api/metrics", &cookie, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["snapshot"]["steps"]["current"], 8432.0);
}

#[tokio::test]
async fn test_submit_with_form_closed() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/dashboard/form",
            &cookie,
            Some(json!({ "steps": 100 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unmount_discards_form_state() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;
    toggle(&app, &cookie).await;

    let response = app
        .clone()
        .oneshot(common::authed_request("DELETE", "/api/dashboard", &cookie, None))
        .await
        .unwrap();
    assert_eq!(common::body_json(response).await["unmounted"], true);

    let response = app
        .clone()
        .oneshot(common::authed_request("DELETE", "/api/dashboard", &cookie, None))
        .await
        .unwrap();
    assert_eq!(common::body_json(response).await["unmounted"], false);

    // Remounting starts from a closed form
    assert_eq!(form_status(&app, &cookie).await, "formClosed");
}

#[tokio::test(start_paused = true)]
async fn test_step_counter_ticks_while_mounted() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;
    form_status(&app, &cookie).await;

    // Three 5 s ticks of +1
    tokio::time::sleep(Duration::from_millis(15_100)).await;

    let response = app
        .oneshot(common::authed_request("GET", "/api/metrics", &cookie, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["snapshot"]["steps"]["current"], 8435.0);
    assert_eq!(body["snapshot"]["heartRate"]["current"], 68.0);
}

#[tokio::test]
async fn test_logout_unmounts_dashboard() {
    let (app, state) = common::create_test_app();
    let cookie = common::login(&app).await;
    form_status(&app, &cookie).await;

    let client = state.clients.get(
        &healthtrack::middleware::auth::verify_jwt(
            cookie.trim_start_matches("healthtrack_token="),
            &state.config.jwt_signing_key,
        )
        .unwrap(),
    )
    .unwrap();
    assert!(client.is_dashboard_mounted());

    app.oneshot(common::authed_request("POST", "/auth/logout", &cookie, None))
        .await
        .unwrap();
    assert!(!client.is_dashboard_mounted());
}
