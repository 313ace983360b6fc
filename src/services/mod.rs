// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth;
pub mod clients;
pub mod dashboard;
pub mod history;
pub mod session;
pub mod snapshot;

pub use auth::{AuthClient, AuthError};
pub use clients::{ClientContext, ClientRegistry, SweepPolicy, Sweeper};
pub use dashboard::{DashboardView, FormStatus, ViewHandle, ViewOptions};
pub use history::HistoryProvider;
pub use session::{SessionStore, Subscription};
pub use snapshot::{FixedIncrement, IncrementSource, MetricSnapshotModel, RandomIncrement};
