// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for signed-in clients.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::models::{weekly_goals, HealthEntry, Notice, WeeklyGoal};
use crate::services::dashboard::{ChartData, MetricCard};
use crate::services::{ClientContext, FormStatus, MetricSnapshotModel};
use crate::time_utils::today_utc;
use axum::{
    extract::Path,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::AppState;

/// API routes (require an active session).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/dashboard", get(get_dashboard).delete(unmount_dashboard))
        .route("/api/dashboard/form/toggle", post(toggle_form))
        .route("/api/dashboard/form/cancel", post(cancel_form))
        .route("/api/dashboard/form", post(submit_entry))
        .route("/api/metrics", get(get_metrics))
        .route("/api/metrics/{metric}/history", get(get_history))
        .route("/api/goals/weekly", get(get_weekly_goals))
}

// ─── User ────────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub email: Option<String>,
    /// Header label: the email, or "User"
    pub label: String,
}

async fn get_me(Extension(user): Extension<AuthUser>) -> Json<UserResponse> {
    let label = user.email.clone().unwrap_or_else(|| "User".to_string());
    Json(UserResponse {
        user_id: user.user_id,
        email: user.email,
        label,
    })
}

// ─── Dashboard ───────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub cards: Vec<MetricCard>,
    pub form_status: FormStatus,
    pub refreshing: bool,
    /// Notifications queued since the last poll
    pub notices: Vec<Notice>,
}

/// Mount the dashboard (if needed) and render it.
async fn get_dashboard(
    Extension(client): Extension<Arc<ClientContext>>,
) -> Json<DashboardResponse> {
    Json(client.with_dashboard(|view| DashboardResponse {
        cards: view.cards(),
        form_status: view.form_status(),
        refreshing: view.is_refreshing(),
        notices: view.take_notices(),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmountResponse {
    pub unmounted: bool,
}

/// Navigate away from the dashboard.
async fn unmount_dashboard(
    Extension(client): Extension<Arc<ClientContext>>,
) -> Json<UnmountResponse> {
    let unmounted = client.unmount_dashboard();
    tracing::debug!(client_id = %client.id(), unmounted, "Dashboard closed by client");
    Json(UnmountResponse { unmounted })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct FormResponse {
    pub form_status: FormStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

async fn toggle_form(Extension(client): Extension<Arc<ClientContext>>) -> Json<FormResponse> {
    let today = today_utc();
    Json(FormResponse {
        form_status: client.with_dashboard(|view| view.toggle_form(today)),
        notice: None,
    })
}

async fn cancel_form(Extension(client): Extension<Arc<ClientContext>>) -> Json<FormResponse> {
    Json(FormResponse {
        form_status: client.with_dashboard(|view| view.cancel_form()),
        notice: None,
    })
}

/// Submit the health data entry form.
async fn submit_entry(
    Extension(client): Extension<Arc<ClientContext>>,
    Json(entry): Json<HealthEntry>,
) -> Result<Json<FormResponse>> {
    let today = today_utc();
    let (result, form_status) = client.with_dashboard(|view| {
        let result = view.submit_entry(&entry, today);
        (result, view.form_status())
    });

    let notice = result?;
    Ok(Json(FormResponse {
        form_status,
        notice: Some(notice),
    }))
}

// ─── Metrics ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MetricsResponse {
    pub snapshot: MetricSnapshotModel,
    pub cards: Vec<MetricCard>,
}

async fn get_metrics(Extension(client): Extension<Arc<ClientContext>>) -> Json<MetricsResponse> {
    Json(client.with_dashboard(|view| MetricsResponse {
        snapshot: view.snapshot(),
        cards: view.cards(),
    }))
}

/// Seven-day chart for one metric. Unknown names chart as zeros.
async fn get_history(
    Extension(client): Extension<Arc<ClientContext>>,
    Path(metric): Path<String>,
) -> Json<ChartData> {
    let today = today_utc();
    Json(client.with_dashboard(|view| view.chart(&metric, today)))
}

async fn get_weekly_goals() -> Json<Vec<WeeklyGoal>> {
    Json(weekly_goals())
}
