// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HealthTrack: personal health metrics dashboard
//!
//! This crate provides the backend API behind the HealthTrack web app:
//! sign-in through Supabase Auth, the per-client session, the dashboard's
//! metric cards, trend charts and health data entry form.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{AuthClient, ClientRegistry, ViewOptions};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub auth: AuthClient,
    pub clients: ClientRegistry,
}

impl AppState {
    /// State with random step increments at the configured interval.
    pub fn new(config: Config, auth: AuthClient) -> Self {
        let view_options = ViewOptions::new(config.steps_refresh_interval);
        Self::with_view_options(config, auth, view_options)
    }

    pub fn with_view_options(config: Config, auth: AuthClient, view_options: ViewOptions) -> Self {
        Self {
            config,
            auth,
            clients: ClientRegistry::new(view_options),
        }
    }
}
