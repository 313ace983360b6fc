// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod credentials;
pub mod entry;
pub mod goals;
pub mod history;
pub mod metric;
pub mod notice;
pub mod session;

pub use credentials::{
    password_strength, LoginRequest, PasswordResetRequest, PasswordStrength, SignupRequest,
    StrengthLevel,
};
pub use entry::HealthEntry;
pub use goals::{weekly_goals, WeeklyGoal};
pub use history::{HistoryPoint, HISTORY_DAYS};
pub use metric::{goal_progress, MetricName, MetricSnapshot, Target, Trend, UnknownMetric};
pub use notice::{Notice, NoticeKind};
pub use session::{Session, SessionSummary};
