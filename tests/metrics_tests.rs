// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Metric snapshot, trend history and weekly goal endpoints.

use axum::http::StatusCode;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_metrics_snapshot() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;

    let response = app
        .oneshot(common::authed_request("GET", "/api/metrics", &cookie, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    let snapshot = &body["snapshot"];
    assert_eq!(snapshot["steps"]["current"], 8432.0);
    assert_eq!(snapshot["steps"]["target"]["goal"], 10000.0);
    assert_eq!(snapshot["steps"]["trend"], "up");
    assert_eq!(snapshot["heartRate"]["target"]["range"]["low"], 60.0);
    assert_eq!(snapshot["sleep"]["trend"], "down");
    assert_eq!(snapshot["water"]["current"], 1800.0);

    let captions: Vec<&str> = body["cards"]
        .as_array()
        .unwrap()
        .iter()
        .map(|card| card["caption"].as_str().unwrap())
        .collect();
    assert_eq!(
        captions,
        vec![
            "84% of daily goal",
            "Normal range: 60-100 BPM",
            "94% of target",
            "90% of daily goal",
        ]
    );
}

#[tokio::test]
async fn test_history_for_each_tab() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;

    for metric in ["steps", "heartRate", "sleep", "water"] {
        let response = app
            .clone()
            .oneshot(common::authed_request(
                "GET",
                &format!("/api/metrics/{metric}/history"),
                &cookie,
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = common::body_json(response).await;
        assert_eq!(body["metric"], metric);
        assert_eq!(body["points"].as_array().unwrap().len(), 7);
        assert_eq!(body["goal_line"].as_array().unwrap().len(), 7);
    }
}

#[tokio::test]
async fn test_history_unknown_metric_is_zeros() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/metrics/bloodOxygen/history",
            &cookie,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    let points = body["points"].as_array().unwrap();
    assert_eq!(points.len(), 7);
    assert!(points.iter().all(|p| p["value"] == 0.0));
    assert!(body.get("goal_line").is_none());
}

#[tokio::test]
async fn test_history_labels_end_today() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/metrics/steps/history",
            &cookie,
            None,
        ))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    let points = body["points"].as_array().unwrap();

    let today = healthtrack::time_utils::today_utc();
    assert_eq!(
        points[6]["label"],
        healthtrack::time_utils::weekday_label(today)
    );
}

#[tokio::test]
async fn test_weekly_goals() {
    let (app, _) = common::create_test_app();
    let cookie = common::login(&app).await;

    let response = app
        .oneshot(common::authed_request("GET", "/api/goals/weekly", &cookie, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    let progress: Vec<u64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["progress"].as_u64().unwrap())
        .collect();
    assert_eq!(progress, vec![75, 88, 86, 96]);
}
