// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-client session store with change notification.
//!
//! A `SessionStore` is handed to whatever needs the signed-in identity;
//! nothing reads it through a global. Listeners are called with the new
//! session after every change, outside the store's lock, so a listener may
//! read the store again.

use crate::models::Session;
use crate::services::auth::{AuthClient, AuthError};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

type Listener = Arc<dyn Fn(Option<&Session>) + Send + Sync>;

#[derive(Default)]
struct Inner {
    session: Option<Session>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

/// Holds at most one active session for a client.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<Inner>>,
}

/// Keeps a listener registered until dropped or unsubscribed.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    store: Weak<Mutex<Inner>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current session, if signed in.
    pub fn get_session(&self) -> Option<Session> {
        self.lock().session.clone()
    }

    /// Register a listener for session changes.
    pub fn on_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&Session>) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        inner.next_listener_id += 1;
        let id = inner.next_listener_id;
        inner.listeners.push((id, Arc::new(listener)));

        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }

    /// Install a session (sign-in or restore), replacing any previous one.
    pub fn restore(&self, session: Session) {
        self.replace(Some(session));
    }

    /// Drop the current session without contacting the provider.
    pub fn clear(&self) {
        self.replace(None);
    }

    fn replace(&self, session: Option<Session>) {
        let listeners: Vec<Listener> = {
            let mut inner = self.lock();
            inner.session = session.clone();
            inner.listeners.iter().map(|(_, l)| l.clone()).collect()
        };

        for listener in listeners {
            listener(session.as_ref());
        }
    }

    /// Sign in through the provider and install the resulting session.
    pub async fn sign_in(
        &self,
        auth: &AuthClient,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let session = auth.sign_in(email, password).await?;
        tracing::info!(user_id = %session.user_id, "Signed in");
        self.restore(session.clone());
        Ok(session)
    }

    /// Register through the provider. Installs the session if one was issued.
    pub async fn sign_up(
        &self,
        auth: &AuthClient,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Option<Session>, AuthError> {
        let session = auth.sign_up(email, password, name).await?;
        if let Some(session) = &session {
            tracing::info!(user_id = %session.user_id, "Signed up");
            self.restore(session.clone());
        }
        Ok(session)
    }

    /// Current session if it is still valid at `now`.
    ///
    /// An expired session is refreshed with its refresh token. If that is
    /// not possible the session is cleared and listeners see `None`.
    pub async fn active_session(&self, auth: &AuthClient, now: DateTime<Utc>) -> Option<Session> {
        let session = self.get_session()?;
        if !session.is_expired(now) {
            return Some(session);
        }

        let refreshed = match &session.refresh_token {
            Some(token) => auth
                .refresh_session(token)
                .await
                .map_err(|e| {
                    tracing::warn!(user_id = %session.user_id, error = %e, "Session refresh failed");
                })
                .ok(),
            None => None,
        };

        // Another request may have replaced the session in the meantime.
        let still_current = self
            .get_session()
            .is_some_and(|current| current.access_token == session.access_token);
        if !still_current {
            return self.get_session();
        }

        match refreshed {
            Some(fresh) => {
                tracing::info!(user_id = %fresh.user_id, "Session refreshed");
                self.restore(fresh.clone());
                Some(fresh)
            }
            None => {
                tracing::info!(user_id = %session.user_id, "Session expired");
                self.clear();
                None
            }
        }
    }

    /// Sign out.
    ///
    /// The local session is cleared even when the provider call fails; the
    /// provider error is still returned so the caller can report it.
    pub async fn sign_out(&self, auth: &AuthClient) -> Result<(), AuthError> {
        let Some(session) = self.get_session() else {
            return Ok(());
        };

        let result = auth.sign_out(&session.access_token).await;

        // Only clear if nobody signed in again while the call was in flight.
        let still_current = self
            .get_session()
            .is_some_and(|current| current.access_token == session.access_token);
        if still_current {
            self.clear();
        }

        if let Err(e) = &result {
            tracing::warn!(user_id = %session.user_id, error = %e, "Provider sign-out failed");
        } else {
            tracing::info!(user_id = %session.user_id, "Signed out");
        }
        result
    }
}
