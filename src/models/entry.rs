// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Manual health data entry submitted from the dashboard form.

use chrono::NaiveDate;
use serde::Deserialize;
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

/// Values recorded through the "Add Health Data" form.
///
/// Every metric is optional; only the ones provided are range-checked.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HealthEntry {
    /// Day the values belong to. Defaults to today.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub steps: Option<f64>,
    /// Resting heart rate in BPM
    #[validate(range(min = 30.0, max = 220.0))]
    pub heart_rate: Option<f64>,
    #[validate(range(min = 0.0, max = 24.0))]
    pub sleep_hours: Option<f64>,
    /// Water intake in ml
    #[validate(range(min = 0.0, max = 10000.0))]
    pub water_intake: Option<f64>,
}

impl HealthEntry {
    /// Earliest date the form accepts.
    pub fn earliest_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Date the entry is recorded for.
    pub fn recorded_date(&self, today: NaiveDate) -> NaiveDate {
        self.date.unwrap_or(today)
    }

    /// Range-check all values plus the date rule (not in the future, not
    /// before 1900-01-01).
    pub fn check(&self, today: NaiveDate) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        let date = self.recorded_date(today);
        if date > today || date < Self::earliest_date() {
            errors.add(
                "date",
                ValidationError::new("date_out_of_range")
                    .with_message(Cow::Borrowed("Date must be between 1900-01-01 and today")),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
