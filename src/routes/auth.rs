// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in, sign-up, password reset and sign-out routes.

use axum::{
    extract::State,
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::config::Config;
use crate::error::Result;
use crate::middleware::auth::{client_from_request, create_jwt, TOKEN_COOKIE};
use crate::models::{
    password_strength, LoginRequest, Notice, PasswordResetRequest, PasswordStrength,
    SessionSummary, SignupRequest, StrengthLevel,
};
use crate::services::ClientContext;
use crate::AppState;

/// Persistent cookie lifetime with "remember me".
const REMEMBER_ME_DAYS: i64 = 30;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/signup", post(signup))
        .route("/auth/password-reset", post(password_reset))
        .route("/auth/password-strength", post(check_password_strength))
        .route("/auth/session", get(get_session))
        .route("/auth/logout", post(logout))
}

/// Response for sign-in, sign-up and session queries.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthResponse {
    pub session: Option<SessionSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

/// Response carrying only a notification.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct NoticeResponse {
    pub notice: Notice,
}

fn token_cookie(config: &Config, value: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .build()
}

/// Attach a fresh token for `client` to the jar.
fn issue_token(
    state: &AppState,
    jar: CookieJar,
    client: &ClientContext,
    remember: bool,
) -> Result<CookieJar> {
    let jwt = create_jwt(client.id(), &state.config.jwt_signing_key)?;
    let mut cookie = token_cookie(&state.config, jwt);
    if remember {
        cookie.set_max_age(time::Duration::days(REMEMBER_ME_DAYS));
    }
    Ok(jar.add(cookie))
}

/// Existing client for this browser, or a new one. The flag is `true`
/// when the context was created here.
fn resolve_client(
    state: &AppState,
    jar: &CookieJar,
    headers: &HeaderMap,
) -> Result<(Arc<ClientContext>, bool)> {
    match client_from_request(state, jar, headers) {
        Some(client) => Ok((client, false)),
        None => Ok((state.clients.create()?, true)),
    }
}

/// Drop a context created for a request that did not produce a session.
fn discard_if_new(state: &AppState, client: &ClientContext, created: bool) {
    if created {
        state.clients.remove(client.id());
    }
}

fn display_name(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    request.validate()?;

    let (client, created) = resolve_client(&state, &jar, &headers)?;

    let session = match client
        .session()
        .sign_in(&state.auth, &request.email, &request.password)
        .await
    {
        Ok(session) => session,
        Err(e) => {
            discard_if_new(&state, &client, created);
            return Err(e.into());
        }
    };

    tracing::info!(client_id = %client.id(), user_id = %session.user_id, "Login successful");

    let jar = issue_token(&state, jar, &client, request.remember_me)?;
    let notice = Notice::success("Login successful")
        .with_description(format!("Welcome back, {}!", display_name(&request.email)));

    Ok((
        jar,
        Json(AuthResponse {
            session: Some(SessionSummary::from(&session)),
            notice: Some(notice),
        }),
    ))
}

async fn signup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(request): Json<SignupRequest>,
) -> Result<(CookieJar, Json<AuthResponse>)> {
    request.validate()?;

    let (client, created) = resolve_client(&state, &jar, &headers)?;

    let outcome = client
        .session()
        .sign_up(&state.auth, &request.email, &request.password, &request.name)
        .await;

    match outcome {
        Ok(Some(session)) => {
            let jar = issue_token(&state, jar, &client, false)?;
            Ok((
                jar,
                Json(AuthResponse {
                    session: Some(SessionSummary::from(&session)),
                    notice: Some(
                        Notice::success("Account created successfully!")
                            .with_description("Welcome to HealthTrack!"),
                    ),
                }),
            ))
        }
        Ok(None) => {
            discard_if_new(&state, &client, created);
            Ok((
                jar,
                Json(AuthResponse {
                    session: None,
                    notice: Some(Notice::info(
                        "Confirm your email",
                        format!(
                            "We sent a confirmation link to {}. Sign in once it is confirmed.",
                            request.email
                        ),
                    )),
                }),
            ))
        }
        Err(e) => {
            discard_if_new(&state, &client, created);
            Err(e.into())
        }
    }
}

async fn password_reset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PasswordResetRequest>,
) -> Result<Json<NoticeResponse>> {
    request.validate()?;

    let redirect_to = format!("{}/login", state.config.frontend_url);
    state
        .auth
        .request_password_reset(&request.email, &redirect_to)
        .await?;

    Ok(Json(NoticeResponse {
        notice: Notice::info(
            "Password reset email sent",
            format!("Check your inbox at {} for instructions.", request.email),
        ),
    }))
}

#[derive(Deserialize)]
struct PasswordStrengthRequest {
    password: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PasswordStrengthResponse {
    #[serde(flatten)]
    pub strength: PasswordStrength,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

async fn check_password_strength(
    Json(request): Json<PasswordStrengthRequest>,
) -> Json<PasswordStrengthResponse> {
    let strength = password_strength(&request.password);

    let notice = (!request.password.is_empty()).then(|| match strength.level {
        StrengthLevel::Weak => Notice::warning(
            "Weak password",
            "Try adding uppercase letters, numbers, and special characters.",
        ),
        StrengthLevel::Moderate => {
            Notice::info("Moderate password strength", "Your password is getting stronger!")
        }
        StrengthLevel::Strong => Notice::success("Strong password")
            .with_description("Your password meets all security requirements!"),
    });

    Json(PasswordStrengthResponse { strength, notice })
}

/// Current session for this browser, or `null`.
async fn get_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Json<AuthResponse> {
    let session = match client_from_request(&state, &jar, &headers) {
        Some(client) => client.session().active_session(&state.auth, Utc::now()).await,
        None => None,
    };

    Json(AuthResponse {
        session: session.as_ref().map(SessionSummary::from),
        notice: None,
    })
}

/// Remove a signed-out client from the registry. A client that signed in
/// again while sign-out was in flight is kept.
fn forget_if_signed_out(state: &AppState, client: &ClientContext) -> bool {
    if client.session().get_session().is_some() {
        tracing::info!(client_id = %client.id(), "Client signed in again during logout, keeping it");
        return false;
    }
    state.clients.remove(client.id());
    tracing::info!(client_id = %client.id(), "Client logged out");
    true
}

/// Sign out and forget the client.
///
/// Always succeeds locally; a provider failure is reported in the notice.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<(CookieJar, Json<NoticeResponse>)> {
    let mut notice = Notice::success("Logged out successfully");

    if let Some(client) = client_from_request(&state, &jar, &headers) {
        // An expired token would be refused by the provider.
        client
            .session()
            .active_session(&state.auth, Utc::now())
            .await;

        let view = client.with_mounted_dashboard(|view| view.handle());
        let result = client.session().sign_out(&state.auth).await;

        if let Err(e) = result {
            notice = Notice::error("Logout failed", e.user_message());
            // Sign-out unmounts the dashboard, so this only lands if the
            // client signed in again while the call was in flight.
            if let Some(view) = view {
                view.notify(notice.clone());
            }
        }

        if !forget_if_signed_out(&state, &client) {
            return Ok((jar, Json(NoticeResponse { notice })));
        }
    }

    let jar = jar.remove(token_cookie(&state.config, String::new()));
    Ok((jar, Json(NoticeResponse { notice })))
}
