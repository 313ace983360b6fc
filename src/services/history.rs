// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Seven-day history series for the trend charts.

use crate::models::{HistoryPoint, HISTORY_DAYS};
use crate::time_utils::{trailing_days, weekday_label};
use chrono::NaiveDate;

/// Fixed week of values per metric, oldest first.
const STEPS: [f64; HISTORY_DAYS] = [7823.0, 9102.0, 8432.0, 10254.0, 7654.0, 9876.0, 8543.0];
const HEART_RATE: [f64; HISTORY_DAYS] = [72.0, 68.0, 70.0, 65.0, 72.0, 68.0, 66.0];
const SLEEP: [f64; HISTORY_DAYS] = [7.2, 6.8, 8.1, 7.5, 6.9, 7.8, 7.5];
const WATER: [f64; HISTORY_DAYS] = [1600.0, 1800.0, 2100.0, 1750.0, 1900.0, 2000.0, 1800.0];
const CALORIES: [f64; HISTORY_DAYS] = [1950.0, 2100.0, 1850.0, 2200.0, 1800.0, 1900.0, 1850.0];

/// Supplies history series by metric name.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryProvider;

impl HistoryProvider {
    pub fn new() -> Self {
        Self
    }

    /// Whether `metric` has a recorded series.
    pub fn is_known(&self, metric: &str) -> bool {
        Self::series(metric).is_some()
    }

    fn series(metric: &str) -> Option<&'static [f64; HISTORY_DAYS]> {
        match metric {
            "steps" => Some(&STEPS),
            "heartRate" => Some(&HEART_RATE),
            "sleep" => Some(&SLEEP),
            "water" => Some(&WATER),
            "calories" => Some(&CALORIES),
            _ => None,
        }
    }

    /// The last seven days of `metric`, labelled by weekday and ending at
    /// `today`.
    ///
    /// Unknown metric names get a series of zeros rather than an error.
    pub fn history(&self, metric: &str, today: NaiveDate) -> Vec<HistoryPoint> {
        let values = Self::series(metric).copied().unwrap_or_else(|| {
            tracing::warn!(metric, "No history for metric, returning zeros");
            [0.0; HISTORY_DAYS]
        });

        trailing_days(today, HISTORY_DAYS)
            .into_iter()
            .zip(values)
            .map(|(day, value)| HistoryPoint {
                label: weekday_label(day),
                value,
            })
            .collect()
    }
}
