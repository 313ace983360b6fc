// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HealthTrack API Server
//!
//! Serves the HealthTrack dashboard API: Supabase-backed sign-in, live
//! metric cards, trend charts and the health data entry form.

use healthtrack::{
    config::Config,
    services::{AuthClient, SweepPolicy},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    // Missing or malformed settings abort start-up
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting HealthTrack API");

    let auth = AuthClient::new(&config.supabase_url, &config.supabase_anon_key);
    tracing::info!(url = %config.supabase_url, "Auth provider configured");

    let port = config.port;
    let state = Arc::new(AppState::new(config, auth));

    let policy = SweepPolicy::from_config(&state.config);
    tracing::info!(
        dashboard_idle = ?policy.dashboard_idle,
        client_idle = ?policy.client_idle,
        "Idle client sweep enabled"
    );
    let _sweeper = state.clients.spawn_sweeper(policy);

    let app = healthtrack::routes::create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("healthtrack=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
