// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current metric values and the background step-counter refresh.

use crate::models::{MetricName, MetricSnapshot, Trend};
use ring::rand::{SecureRandom, SystemRandom};
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Current values for every tracked metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshotModel {
    steps: MetricSnapshot,
    heart_rate: MetricSnapshot,
    sleep: MetricSnapshot,
    water: MetricSnapshot,
}

impl Default for MetricSnapshotModel {
    fn default() -> Self {
        Self::initial()
    }
}

impl MetricSnapshotModel {
    /// Values shown before the user records anything.
    pub fn initial() -> Self {
        Self {
            steps: MetricSnapshot::with_goal(8432.0, 10000.0, Trend::Up),
            heart_rate: MetricSnapshot::with_range(68.0, 60.0, 100.0, Trend::Stable),
            sleep: MetricSnapshot::with_goal(7.5, 8.0, Trend::Down),
            water: MetricSnapshot::with_goal(1800.0, 2000.0, Trend::Up),
        }
    }

    pub fn get(&self, metric: MetricName) -> &MetricSnapshot {
        match metric {
            MetricName::Steps => &self.steps,
            MetricName::HeartRate => &self.heart_rate,
            MetricName::Sleep => &self.sleep,
            MetricName::Water => &self.water,
        }
    }

    fn get_mut(&mut self, metric: MetricName) -> &mut MetricSnapshot {
        match metric {
            MetricName::Steps => &mut self.steps,
            MetricName::HeartRate => &mut self.heart_rate,
            MetricName::Sleep => &mut self.sleep,
            MetricName::Water => &mut self.water,
        }
    }

    /// Add `delta` to a metric's current value. The result never drops
    /// below zero.
    pub fn update(&mut self, metric: MetricName, delta: f64) {
        let snapshot = self.get_mut(metric);
        snapshot.current = (snapshot.current + delta).max(0.0);
    }
}

/// Shared handle to a view's snapshot.
pub type SharedSnapshot = Arc<Mutex<MetricSnapshotModel>>;

/// Supplies the step increment for each refresh tick.
pub trait IncrementSource: Send + Sync + 'static {
    fn next_increment(&self) -> f64;
}

/// Uniform whole number of steps in `0..=9`.
pub struct RandomIncrement {
    rng: SystemRandom,
}

impl RandomIncrement {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for RandomIncrement {
    fn default() -> Self {
        Self::new()
    }
}

impl IncrementSource for RandomIncrement {
    fn next_increment(&self) -> f64 {
        let mut byte = [0u8; 1];
        loop {
            // Skip the tick's increment rather than fail if the OS RNG errors.
            match self.rng.fill(&mut byte) {
                // 250 is the largest multiple of 10 below 256; redraw above
                // it to keep the distribution uniform.
                Ok(()) if byte[0] < 250 => return f64::from(byte[0] % 10),
                Ok(()) => continue,
                Err(_) => return 0.0,
            }
        }
    }
}

/// The same increment every tick.
pub struct FixedIncrement(pub f64);

impl IncrementSource for FixedIncrement {
    fn next_increment(&self) -> f64 {
        self.0
    }
}

/// Running refresh task. Dropping it stops the task.
#[must_use = "dropping a RefreshTimer cancels it"]
pub struct RefreshTimer {
    handle: JoinHandle<()>,
}

impl RefreshTimer {
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Bump the step counter every `period`, starting one period from now.
///
/// The task holds only a weak reference to the snapshot and exits on its
/// own once the snapshot is gone. Must be called within a tokio runtime.
pub fn spawn_refresh(
    snapshot: &SharedSnapshot,
    period: Duration,
    increments: Arc<dyn IncrementSource>,
) -> RefreshTimer {
    let weak: Weak<Mutex<MetricSnapshotModel>> = Arc::downgrade(snapshot);

    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            let Some(snapshot) = weak.upgrade() else {
                tracing::debug!("Snapshot dropped, stopping refresh");
                break;
            };

            let delta = increments.next_increment();
            let mut model = snapshot.lock().unwrap_or_else(PoisonError::into_inner);
            model.update(MetricName::Steps, delta);
            tracing::trace!(
                steps = model.get(MetricName::Steps).current,
                delta,
                "Step counter refreshed"
            );
        }
    });

    RefreshTimer { handle }
}
