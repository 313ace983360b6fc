// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated session issued by the auth provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Label shown when the provider did not return an email.
const FALLBACK_LABEL: &str = "User";

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Provider access token (opaque)
    pub access_token: String,
    /// Provider refresh token, when issued
    pub refresh_token: Option<String>,
    /// Provider user ID
    pub user_id: String,
    /// Email address, if the provider returned one
    pub email: Option<String>,
    /// When the access token expires (RFC 3339)
    pub expires_at: String,
}

impl Session {
    /// Display label for the signed-in user.
    pub fn display_label(&self) -> &str {
        self.email.as_deref().unwrap_or(FALLBACK_LABEL)
    }

    /// Whether the access token has expired at `now`. An unreadable expiry
    /// counts as expired.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => expires_at <= now,
            Err(_) => true,
        }
    }
}

/// Session as exposed to the browser. Tokens never leave the server.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionSummary {
    pub user_id: String,
    pub email: Option<String>,
    pub label: String,
    pub expires_at: String,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id.clone(),
            email: session.email.clone(),
            label: session.display_label().to_string(),
            expires_at: session.expires_at.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(expires_at: &str) -> Session {
        Session {
            access_token: "at".to_string(),
            refresh_token: None,
            user_id: "u1".to_string(),
            email: None,
            expires_at: expires_at.to_string(),
        }
    }

    #[test]
    fn test_is_expired() {
        let now = DateTime::parse_from_rfc3339("2026-03-14T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert!(session("2000-01-01T00:00:00Z").is_expired(now));
        assert!(session("2026-03-14T12:00:00Z").is_expired(now));
        assert!(!session("2026-03-14T13:00:00+00:00").is_expired(now));
        assert!(session("tomorrow").is_expired(now));
    }

    #[test]
    fn test_display_label_fallback() {
        assert_eq!(session("2000-01-01T00:00:00Z").display_label(), "User");
    }
}
