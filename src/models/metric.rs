// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracked health metrics and goal progress.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// The closed set of metrics shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub enum MetricName {
    Steps,
    HeartRate,
    Sleep,
    Water,
}

impl MetricName {
    pub const ALL: [MetricName; 4] = [
        MetricName::Steps,
        MetricName::HeartRate,
        MetricName::Sleep,
        MetricName::Water,
    ];

    /// Wire name (`steps`, `heartRate`, `sleep`, `water`).
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::Steps => "steps",
            MetricName::HeartRate => "heartRate",
            MetricName::Sleep => "sleep",
            MetricName::Water => "water",
        }
    }

    /// Line colour of the metric's chart tab.
    pub fn chart_color(&self) -> &'static str {
        match self {
            MetricName::Steps => "#22c55e",
            MetricName::HeartRate => "#ef4444",
            MetricName::Sleep => "#8b5cf6",
            MetricName::Water => "#3b82f6",
        }
    }

    /// Reference line drawn on the metric's chart tab.
    ///
    /// Heart rate is range-based on the cards but the chart still draws a
    /// 70 BPM reference line.
    pub fn chart_goal(&self) -> f64 {
        match self {
            MetricName::Steps => 10000.0,
            MetricName::HeartRate => 70.0,
            MetricName::Sleep => 8.0,
            MetricName::Water => 2000.0,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown metric: {0}")]
pub struct UnknownMetric(pub String);

impl FromStr for MetricName {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricName::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// What a metric's current value is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub enum Target {
    /// A single daily target (steps, sleep, water).
    Goal(f64),
    /// A normal band (heart rate).
    Range { low: f64, high: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub enum Trend {
    Up,
    Stable,
    Down,
}

/// Current value of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricSnapshot {
    pub current: f64,
    pub target: Target,
    pub trend: Trend,
}

impl MetricSnapshot {
    pub fn with_goal(current: f64, goal: f64, trend: Trend) -> Self {
        Self {
            current,
            target: Target::Goal(goal),
            trend,
        }
    }

    pub fn with_range(current: f64, low: f64, high: f64, trend: Trend) -> Self {
        Self {
            current,
            target: Target::Range { low, high },
            trend,
        }
    }

    /// Percent of goal reached. `None` for range-based metrics.
    ///
    /// Computed on every call; nothing is cached.
    pub fn progress(&self) -> Option<u8> {
        match self.target {
            Target::Goal(goal) => Some(goal_progress(self.current, goal)),
            Target::Range { .. } => None,
        }
    }
}

/// Percent of `goal` reached by `current`, rounded half-up and clamped to
/// `0..=100`.
///
/// A zero (or negative) goal counts as met by any positive value.
pub fn goal_progress(current: f64, goal: f64) -> u8 {
    if goal <= 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }

    let ratio = current.max(0.0) * 100.0 / goal;
    // Non-negative here, so `round` (half away from zero) is half-up.
    // A NaN ratio saturates to 0 in the cast.
    ratio.round().clamp(0.0, 100.0) as u8
}
