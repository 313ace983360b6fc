// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.

use crate::error::AppError;
use crate::services::ClientContext;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Cookie carrying the client token.
pub const TOKEN_COOKIE: &str = "healthtrack_token";

/// Lifetime of a client token (30 days).
pub const TOKEN_TTL_SECS: usize = 30 * 24 * 60 * 60;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (client ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from the client's session.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub client_id: String,
    pub user_id: String,
    pub email: Option<String>,
}

/// Token from the cookie, falling back to the `Authorization` header.
pub fn extract_token(jar: &CookieJar, headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Verify a client token and return the client ID.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Option<String> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims.sub)
}

/// Client context named by the request's token, if any.
pub fn client_from_request(
    state: &AppState,
    jar: &CookieJar,
    headers: &axum::http::HeaderMap,
) -> Option<Arc<ClientContext>> {
    let token = extract_token(jar, headers)?;
    let client_id = verify_jwt(&token, &state.config.jwt_signing_key)?;
    state.clients.get(&client_id)
}

/// Middleware that requires a valid token and an active session.
///
/// An expired provider session is refreshed here, or cleared if it cannot
/// be.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(&jar, request.headers()).ok_or(AppError::Unauthorized)?;

    let client_id =
        verify_jwt(&token, &state.config.jwt_signing_key).ok_or(AppError::InvalidToken)?;

    let client = state
        .clients
        .get(&client_id)
        .ok_or(AppError::InvalidToken)?;

    let session = client
        .session()
        .active_session(&state.auth, Utc::now())
        .await
        .ok_or_else(|| {
            tracing::debug!(client_id = %client_id, "Token valid but client is signed out");
            AppError::Unauthorized
        })?;

    let auth_user = AuthUser {
        client_id,
        user_id: session.user_id,
        email: session.email,
    };
    request.extensions_mut().insert(auth_user);
    request.extensions_mut().insert(client);

    Ok(next.run(request).await)
}

/// Create a JWT naming a client context.
pub fn create_jwt(client_id: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: client_id.to_string(),
        iat: now,
        exp: now + TOKEN_TTL_SECS,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
