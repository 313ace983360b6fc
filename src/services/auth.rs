// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Supabase Auth (GoTrue) client.
//!
//! Handles:
//! - Email/password sign-in and sign-up
//! - Sign-out (access token revocation)
//! - Password reset emails
//! - An in-memory mock directory for tests and local development

use crate::models::Session;
use crate::time_utils::format_utc_rfc3339;
use axum::http::StatusCode;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Errors reported by the auth provider.
///
/// None of these are retried automatically; they are surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Rejected(String),

    #[error("Too many requests, please try again later")]
    RateLimited,

    #[error("Auth service unreachable: {0}")]
    Network(String),

    #[error("Auth service error ({status}): {message}")]
    Provider { status: u16, message: String },
}

impl AuthError {
    /// HTTP status used when the error is returned to the browser.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Rejected(_) => StatusCode::BAD_REQUEST,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Network(_) | AuthError::Provider { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Whether trying again later might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::RateLimited | AuthError::Network(_) | AuthError::Provider { .. }
        )
    }

    /// Text for the user-facing notice.
    pub fn user_message(&self) -> String {
        match self {
            // Already says so
            AuthError::RateLimited => self.to_string(),
            _ if self.is_retryable() => format!("{}. Please try again in a moment.", self),
            _ => self.to_string(),
        }
    }
}

/// User object returned by GoTrue.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Successful token grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    user: ProviderUser,
}

/// Sign-up returns a token grant when email confirmation is disabled and a
/// bare user otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignupResponse {
    Session(TokenResponse),
    PendingConfirmation(ProviderUser),
}

/// GoTrue error body. Older and newer API versions use different fields.
#[derive(Debug, Default, Deserialize)]
struct ProviderErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ProviderErrorBody {
    fn message(&self) -> String {
        self.error_description
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.message.clone())
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }

    fn is_invalid_credentials(&self) -> bool {
        self.error.as_deref() == Some("invalid_grant")
            || self.error_code.as_deref() == Some("invalid_credentials")
    }
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(self.expires_in);
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user_id: self.user.id,
            email: self.user.email,
            expires_at: format_utc_rfc3339(expires_at),
        }
    }
}

/// Client for the managed auth service.
#[derive(Clone)]
pub struct AuthClient {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Remote {
        http: reqwest::Client,
        base_url: String,
        anon_key: String,
    },
    Mock(Arc<MockDirectory>),
}

impl AuthClient {
    /// Create a client for a Supabase project.
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            backend: Backend::Remote {
                http: reqwest::Client::new(),
                base_url: format!("{}/auth/v1", base_url.trim_end_matches('/')),
                anon_key: anon_key.to_string(),
            },
        }
    }

    /// Create an in-memory client (offline).
    pub fn new_mock() -> Self {
        Self {
            backend: Backend::Mock(Arc::new(MockDirectory::default())),
        }
    }

    /// Mock directory backing this client, if it is a mock.
    pub fn mock(&self) -> Option<&MockDirectory> {
        match &self.backend {
            Backend::Mock(directory) => Some(directory),
            Backend::Remote { .. } => None,
        }
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        match &self.backend {
            Backend::Mock(directory) => directory.sign_in(email, password),
            Backend::Remote {
                http,
                base_url,
                anon_key,
            } => {
                let response = http
                    .post(format!("{}/token", base_url))
                    .query(&[("grant_type", "password")])
                    .header("apikey", anon_key)
                    .json(&Credentials { email, password })
                    .send()
                    .await
                    .map_err(|e| AuthError::Network(e.to_string()))?;

                let token: TokenResponse = check_response_json(response).await?;
                Ok(token.into_session())
            }
        }
    }

    /// Register a new account.
    ///
    /// Returns `None` when the account must confirm its email before a
    /// session is issued.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Option<Session>, AuthError> {
        match &self.backend {
            Backend::Mock(directory) => directory.sign_up(email, password),
            Backend::Remote {
                http,
                base_url,
                anon_key,
            } => {
                let body = serde_json::json!({
                    "email": email,
                    "password": password,
                    "data": { "full_name": name },
                });

                let response = http
                    .post(format!("{}/signup", base_url))
                    .header("apikey", anon_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| AuthError::Network(e.to_string()))?;

                match check_response_json(response).await? {
                    SignupResponse::Session(token) => Ok(Some(token.into_session())),
                    SignupResponse::PendingConfirmation(user) => {
                        tracing::info!(user_id = %user.id, "Sign-up pending email confirmation");
                        Ok(None)
                    }
                }
            }
        }
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        match &self.backend {
            Backend::Mock(directory) => directory.refresh(refresh_token),
            Backend::Remote {
                http,
                base_url,
                anon_key,
            } => {
                let response = http
                    .post(format!("{}/token", base_url))
                    .query(&[("grant_type", "refresh_token")])
                    .header("apikey", anon_key)
                    .json(&serde_json::json!({ "refresh_token": refresh_token }))
                    .send()
                    .await
                    .map_err(|e| AuthError::Network(e.to_string()))?;

                let token: TokenResponse = check_response_json(response).await?;
                Ok(token.into_session())
            }
        }
    }

    /// Revoke an access token.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        match &self.backend {
            Backend::Mock(directory) => directory.sign_out(access_token),
            Backend::Remote {
                http,
                base_url,
                anon_key,
            } => {
                let response = http
                    .post(format!("{}/logout", base_url))
                    .header("apikey", anon_key)
                    .bearer_auth(access_token)
                    .send()
                    .await
                    .map_err(|e| AuthError::Network(e.to_string()))?;

                check_response(response).await.map(|_| ())
            }
        }
    }

    /// Ask the provider to email a password reset link.
    pub async fn request_password_reset(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<(), AuthError> {
        match &self.backend {
            Backend::Mock(directory) => directory.request_password_reset(email),
            Backend::Remote {
                http,
                base_url,
                anon_key,
            } => {
                let url = format!(
                    "{}/recover?redirect_to={}",
                    base_url,
                    urlencoding::encode(redirect_to)
                );

                let response = http
                    .post(url)
                    .header("apikey", anon_key)
                    .json(&serde_json::json!({ "email": email }))
                    .send()
                    .await
                    .map_err(|e| AuthError::Network(e.to_string()))?;

                check_response(response).await.map(|_| ())
            }
        }
    }
}

/// Map non-success statuses to `AuthError`.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(AuthError::RateLimited);
    }

    let text = response.text().await.unwrap_or_default();
    let body: ProviderErrorBody = serde_json::from_str(&text).unwrap_or_default();

    if status.is_client_error() {
        if body.is_invalid_credentials() {
            return Err(AuthError::InvalidCredentials);
        }
        return Err(AuthError::Rejected(body.message()));
    }

    tracing::error!(status = status.as_u16(), body = %text, "Auth provider error");
    Err(AuthError::Provider {
        status: status.as_u16(),
        message: body.message(),
    })
}

async fn check_response_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, AuthError> {
    let response = check_response(response).await?;
    response.json().await.map_err(|e| AuthError::Provider {
        status: 200,
        message: format!("Unexpected response body: {}", e),
    })
}

// ─── Mock Directory ──────────────────────────────────────────

struct MockAccount {
    user_id: String,
    password: String,
}

/// In-memory stand-in for the auth service.
#[derive(Default)]
pub struct MockDirectory {
    accounts: DashMap<String, MockAccount>,
    /// Live access tokens -> email
    tokens: DashMap<String, String>,
    /// Unused refresh tokens -> email
    refresh_tokens: DashMap<String, String>,
    next_user: AtomicU64,
    unavailable: AtomicBool,
    /// Emails that asked for a password reset, in order
    reset_requests: std::sync::Mutex<Vec<String>>,
}

impl MockDirectory {
    /// Register an account directly (test setup).
    pub fn add_account(&self, email: &str, password: &str) -> String {
        let user_id = format!(
            "mock-user-{}",
            self.next_user.fetch_add(1, Ordering::Relaxed) + 1
        );
        self.accounts.insert(
            email.to_lowercase(),
            MockAccount {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        user_id
    }

    /// Simulate the service being unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    /// Revoke an access token behind the client's back.
    pub fn revoke(&self, access_token: &str) {
        self.tokens.remove(access_token);
    }

    /// Whether an access token is still live.
    pub fn is_live(&self, access_token: &str) -> bool {
        self.tokens.contains_key(access_token)
    }

    /// Password reset requests received so far.
    pub fn reset_requests(&self) -> Vec<String> {
        self.reset_requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn check_available(&self) -> Result<(), AuthError> {
        if self.unavailable.load(Ordering::Relaxed) {
            Err(AuthError::Network("mock auth service unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn issue(&self, email: &str, user_id: &str) -> Result<Session, AuthError> {
        let new_token = || {
            crate::services::clients::random_id().map_err(|e| AuthError::Provider {
                status: 500,
                message: e.to_string(),
            })
        };
        let access_token = new_token()?;
        let refresh_token = new_token()?;
        self.tokens.insert(access_token.clone(), email.to_string());
        self.refresh_tokens
            .insert(refresh_token.clone(), email.to_string());

        Ok(Session {
            access_token,
            refresh_token: Some(refresh_token),
            user_id: user_id.to_string(),
            email: Some(email.to_string()),
            expires_at: format_utc_rfc3339(chrono::Utc::now() + chrono::Duration::hours(1)),
        })
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.check_available()?;
        let email = email.to_lowercase();
        let user_id = match self.accounts.get(&email) {
            Some(account) if account.password == password => account.user_id.clone(),
            _ => return Err(AuthError::InvalidCredentials),
        };
        self.issue(&email, &user_id)
    }

    fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        self.check_available()?;
        let email = email.to_lowercase();
        if self.accounts.contains_key(&email) {
            return Err(AuthError::Rejected("User already registered".to_string()));
        }
        let user_id = self.add_account(&email, password);
        self.issue(&email, &user_id).map(Some)
    }

    /// Refresh tokens are single use.
    fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.check_available()?;
        let (_, email) = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| AuthError::Rejected("Invalid Refresh Token".to_string()))?;
        let user_id = self
            .accounts
            .get(&email)
            .map(|account| account.user_id.clone())
            .ok_or_else(|| AuthError::Rejected("User not found".to_string()))?;
        self.issue(&email, &user_id)
    }

    fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        self.check_available()?;
        self.tokens
            .remove(access_token)
            .map(|_| ())
            .ok_or_else(|| AuthError::Rejected("Session not found".to_string()))
    }

    fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.check_available()?;
        if let Ok(mut requests) = self.reset_requests.lock() {
            requests.push(email.to_lowercase());
        }
        Ok(())
    }
}
