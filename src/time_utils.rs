// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Datelike, Days, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Today's date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// The `count` days ending at `today`, oldest first.
pub fn trailing_days(today: NaiveDate, count: usize) -> Vec<NaiveDate> {
    (0..count)
        .rev()
        .map(|back| today.checked_sub_days(Days::new(back as u64)).unwrap_or(NaiveDate::MIN))
        .collect()
}

/// Short English weekday name ("Mon").
pub fn weekday_label(date: NaiveDate) -> String {
    date.format("%a").to_string()
}

/// Long date with ordinal day ("March 14th, 2026").
pub fn format_long_date(date: NaiveDate) -> String {
    let day = date.day();
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{} {}{}, {}", date.format("%B"), day, suffix, date.year())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_days_end_today() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let days = trailing_days(today, 7);
        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 2, 24).unwrap());
        assert_eq!(days[6], today);
    }

    #[test]
    fn test_weekday_label() {
        // 2026-03-14 is a Saturday
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(weekday_label(date), "Sat");
    }

    #[test]
    fn test_format_long_date() {
        let date = |d| NaiveDate::from_ymd_opt(2026, 3, d).unwrap();
        assert_eq!(format_long_date(date(1)), "March 1st, 2026");
        assert_eq!(format_long_date(date(12)), "March 12th, 2026");
        assert_eq!(format_long_date(date(22)), "March 22nd, 2026");
        assert_eq!(format_long_date(date(23)), "March 23rd, 2026");
    }
}
