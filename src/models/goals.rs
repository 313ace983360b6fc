// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weekly goal progress shown beside the daily cards.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::goal_progress;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WeeklyGoal {
    pub name: &'static str,
    pub current: f64,
    pub target: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    /// Percent complete, 0..=100
    pub progress: u8,
}

impl WeeklyGoal {
    fn new(name: &'static str, current: f64, target: f64, unit: Option<&'static str>) -> Self {
        Self {
            name,
            current,
            target,
            unit,
            progress: goal_progress(current, target),
        }
    }
}

/// This week's goals. Fixed values until entries are persisted.
pub fn weekly_goals() -> Vec<WeeklyGoal> {
    vec![
        WeeklyGoal::new("Steps", 52450.0, 70000.0, None),
        WeeklyGoal::new("Sleep", 49.0, 56.0, Some("hours")),
        WeeklyGoal::new("Water", 12000.0, 14000.0, Some("ml")),
        WeeklyGoal::new("Calories", 13500.0, 14000.0, None),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekly_goal_progress() {
        let goals = weekly_goals();
        let progress: Vec<u8> = goals.iter().map(|g| g.progress).collect();
        // 74.93, 87.5, 85.71, 96.43
        assert_eq!(progress, vec![75, 88, 86, 96]);
    }
}
