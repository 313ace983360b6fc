// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The auth provider coordinates are mandatory: the server refuses to start
//! without them instead of serving a dashboard nobody can sign in to.

use std::env;
use std::time::Duration;

/// Default interval between mock step-counter refreshes.
pub const DEFAULT_STEPS_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

pub const DEFAULT_DASHBOARD_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Matches the lifetime of the client token; after that the context is
/// unreachable anyway.
pub const DEFAULT_CLIENT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Supabase project (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Public (anon) API key for the Supabase project
    pub supabase_anon_key: String,
    /// JWT signing key for client session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Frontend URL for CORS, cookies and password reset redirects
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// How often the dashboard's step counter ticks
    pub steps_refresh_interval: Duration,
    /// Unmount a client's dashboard after this long without requests
    pub dashboard_idle_timeout: Duration,
    /// Forget a client after this long without requests
    pub client_idle_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let supabase_url = env::var("SUPABASE_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .map_err(|_| ConfigError::Missing("SUPABASE_URL"))?;
        if !(supabase_url.starts_with("http://") || supabase_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "SUPABASE_URL",
                reason: "must be an http(s) URL".to_string(),
            });
        }

        let supabase_anon_key = env::var("SUPABASE_ANON_KEY")
            .map(|v| v.trim().to_string())
            .map_err(|_| ConfigError::Missing("SUPABASE_ANON_KEY"))?;
        if supabase_anon_key.is_empty() {
            return Err(ConfigError::Invalid {
                var: "SUPABASE_ANON_KEY",
                reason: "must not be empty".to_string(),
            });
        }

        let steps_refresh_interval =
            duration_secs("STEPS_REFRESH_INTERVAL_SECS", DEFAULT_STEPS_REFRESH_INTERVAL)?;
        let dashboard_idle_timeout =
            duration_secs("DASHBOARD_IDLE_TIMEOUT_SECS", DEFAULT_DASHBOARD_IDLE_TIMEOUT)?;
        let client_idle_timeout =
            duration_secs("CLIENT_IDLE_TIMEOUT_SECS", DEFAULT_CLIENT_IDLE_TIMEOUT)?;

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            frontend_url: env::var("FRONTEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            steps_refresh_interval,
            dashboard_idle_timeout,
            client_idle_timeout,
        })
    }

    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            frontend_url: "http://localhost:3000".to_string(),
            port: 8080,
            steps_refresh_interval: DEFAULT_STEPS_REFRESH_INTERVAL,
            dashboard_idle_timeout: DEFAULT_DASHBOARD_IDLE_TIMEOUT,
            client_idle_timeout: DEFAULT_CLIENT_IDLE_TIMEOUT,
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Whole seconds from `var`, at least 1.
fn duration_secs(var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let Ok(raw) = env::var(var) else {
        return Ok(default);
    };
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        reason: format!("not a whole number of seconds: {raw}"),
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            var,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
