// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-browser client contexts.
//!
//! Each browser (all of its tabs share one cookie) gets a `ClientContext`
//! holding its session store and, while it is looking at the dashboard, a
//! mounted `DashboardView`. Signing out unmounts the view.
//!
//! Contexts are only reachable through the client cookie, so a background
//! sweep unmounts dashboards nobody is polling and forgets clients that
//! have gone quiet.

use crate::config::Config;
use crate::services::dashboard::{DashboardView, ViewOptions};
use crate::services::session::{SessionStore, Subscription};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

const CLIENT_ID_BYTES: usize = 32;

/// Random URL-safe identifier.
pub fn random_id() -> anyhow::Result<String> {
    let mut bytes = [0u8; CLIENT_ID_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| anyhow::anyhow!("System random number generator failed"))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

type DashboardSlot = Arc<Mutex<Option<DashboardView>>>;

fn lock_slot(slot: &Mutex<Option<DashboardView>>) -> MutexGuard<'_, Option<DashboardView>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State for one browser client.
pub struct ClientContext {
    id: String,
    session: SessionStore,
    dashboard: DashboardSlot,
    view_options: ViewOptions,
    last_seen: Mutex<Instant>,
    _session_watch: Subscription,
}

impl ClientContext {
    fn new(id: String, view_options: ViewOptions) -> Self {
        let session = SessionStore::new();
        let dashboard: DashboardSlot = Arc::new(Mutex::new(None));

        // Unmount on sign-out. The listener must not keep the slot alive.
        let slot = Arc::downgrade(&dashboard);
        let client_id = id.clone();
        let session_watch = session.on_change(move |current| {
            if current.is_some() {
                return;
            }
            if let Some(slot) = slot.upgrade() {
                let unmounted = lock_slot(&slot).take();
                if unmounted.is_some() {
                    tracing::info!(client_id = %client_id, "Session ended, dashboard unmounted");
                }
            }
        });

        Self {
            id,
            session,
            dashboard,
            view_options,
            last_seen: Mutex::new(Instant::now()),
            _session_watch: session_watch,
        }
    }

    /// Record a request from this client.
    pub fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Time since the last request as of `now`.
    pub fn idle_for(&self, now: Instant) -> Duration {
        let last_seen = *self.last_seen.lock().unwrap_or_else(PoisonError::into_inner);
        now.saturating_duration_since(last_seen)
    }

    /// Idle past the client limit, or past the dashboard limit while
    /// signed out.
    fn is_stale(&self, policy: &SweepPolicy, now: Instant) -> bool {
        let idle = self.idle_for(now);
        idle >= policy.client_idle
            || (idle >= policy.dashboard_idle && self.session.get_session().is_none())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Run `f` against the dashboard, mounting it first if needed.
    pub fn with_dashboard<R>(&self, f: impl FnOnce(&DashboardView) -> R) -> R {
        let mut slot = lock_slot(&self.dashboard);
        let view = slot.get_or_insert_with(|| {
            tracing::info!(client_id = %self.id, "Mounting dashboard");
            DashboardView::mount(&self.view_options)
        });
        f(view)
    }

    /// Run `f` against the dashboard only if it is mounted.
    pub fn with_mounted_dashboard<R>(&self, f: impl FnOnce(&DashboardView) -> R) -> Option<R> {
        lock_slot(&self.dashboard).as_ref().map(f)
    }

    pub fn is_dashboard_mounted(&self) -> bool {
        lock_slot(&self.dashboard).is_some()
    }

    /// Unmount the dashboard (navigating away). Returns whether one was
    /// mounted.
    pub fn unmount_dashboard(&self) -> bool {
        // Drop the view after releasing the lock.
        let view = lock_slot(&self.dashboard).take();
        view.is_some()
    }
}

/// Idle limits applied by the registry sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
    /// How often the sweep runs
    pub period: Duration,
    /// Unmount the dashboard after this long without requests
    pub dashboard_idle: Duration,
    /// Forget the client after this long without requests
    pub client_idle: Duration,
}

impl SweepPolicy {
    pub const DEFAULT_PERIOD: Duration = Duration::from_secs(60);

    pub fn from_config(config: &Config) -> Self {
        Self {
            period: Self::DEFAULT_PERIOD,
            dashboard_idle: config.dashboard_idle_timeout,
            client_idle: config.client_idle_timeout,
        }
    }
}

type ClientMap = DashMap<String, Arc<ClientContext>>;

/// Remove stale contexts and unmount idle dashboards. Returns the number
/// of contexts removed.
fn sweep_clients(clients: &ClientMap, policy: &SweepPolicy, now: Instant) -> usize {
    let candidates: Vec<Arc<ClientContext>> = clients
        .iter()
        .filter(|entry| entry.value().idle_for(now) >= policy.dashboard_idle)
        .map(|entry| entry.value().clone())
        .collect();

    let mut removed = Vec::new();
    for context in candidates {
        // Re-checked under the shard lock in case a request just arrived.
        if let Some((_, context)) =
            clients.remove_if(context.id(), |_, context| context.is_stale(policy, now))
        {
            tracing::info!(client_id = %context.id(), "Idle client removed");
            removed.push(context);
        } else if context.idle_for(now) >= policy.dashboard_idle && context.unmount_dashboard() {
            tracing::info!(client_id = %context.id(), "Idle dashboard unmounted");
        }
    }

    // Contexts (and their dashboards) drop here, outside any map lock.
    removed.len()
}

/// Running sweep task. Dropping it stops the task.
#[must_use = "dropping a Sweeper cancels it"]
pub struct Sweeper {
    handle: JoinHandle<()>,
}

impl Sweeper {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// All known clients, keyed by client ID.
pub struct ClientRegistry {
    clients: Arc<ClientMap>,
    view_options: ViewOptions,
}

impl ClientRegistry {
    pub fn new(view_options: ViewOptions) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            view_options,
        }
    }

    /// Look up a client, counting it as a request for the idle sweep.
    pub fn get(&self, client_id: &str) -> Option<Arc<ClientContext>> {
        let context = self.clients.get(client_id).map(|entry| entry.value().clone())?;
        context.touch();
        Some(context)
    }

    /// Create a context under a fresh random ID.
    pub fn create(&self) -> anyhow::Result<Arc<ClientContext>> {
        let id = random_id()?;
        let context = Arc::new(ClientContext::new(id.clone(), self.view_options.clone()));
        self.clients.insert(id, context.clone());
        tracing::debug!(clients = self.clients.len(), "Client context created");
        Ok(context)
    }

    pub fn remove(&self, client_id: &str) -> Option<Arc<ClientContext>> {
        self.clients.remove(client_id).map(|(_, context)| context)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Run one sweep now.
    pub fn sweep(&self, policy: &SweepPolicy) -> usize {
        sweep_clients(&self.clients, policy, Instant::now())
    }

    /// Sweep every `policy.period`, starting one period from now.
    ///
    /// The task holds only a weak reference to the client map. Must be
    /// called within a tokio runtime.
    pub fn spawn_sweeper(&self, policy: SweepPolicy) -> Sweeper {
        let weak = Arc::downgrade(&self.clients);

        let handle = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval_at(Instant::now() + policy.period, policy.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let Some(clients) = weak.upgrade() else {
                    tracing::debug!("Client registry dropped, stopping sweep");
                    break;
                };

                let removed = sweep_clients(&clients, &policy, Instant::now());
                tracing::debug!(removed, remaining = clients.len(), "Client sweep finished");
            }
        });

        Sweeper { handle }
    }
}
