// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Dashboard view: metric cards, trend charts and the entry form.
//!
//! A `DashboardView` is mounted for a signed-in client and unmounted by
//! dropping it. While mounted it owns the metric snapshot and the refresh
//! timer that keeps the step counter moving.

use crate::error::AppError;
use crate::models::{HealthEntry, HistoryPoint, MetricName, Notice, Target, Trend};
use crate::services::history::HistoryProvider;
use crate::services::snapshot::{
    spawn_refresh, IncrementSource, MetricSnapshotModel, RandomIncrement, RefreshTimer,
    SharedSnapshot,
};
use crate::time_utils::format_long_date;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use validator::ValidationErrors;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Line colour for charts of metrics without a dashboard tab.
const DEFAULT_CHART_COLOR: &str = "#94a3b8";

/// How a mounted view refreshes its snapshot.
#[derive(Clone)]
pub struct ViewOptions {
    pub refresh_interval: Duration,
    pub increments: Arc<dyn IncrementSource>,
}

impl ViewOptions {
    /// Random step increments every `refresh_interval`.
    pub fn new(refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            increments: Arc::new(RandomIncrement::new()),
        }
    }

    pub fn with_increments(mut self, increments: Arc<dyn IncrementSource>) -> Self {
        self.increments = increments;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub enum FormStatus {
    FormClosed,
    FormOpen,
}

/// The mounted entry form.
#[derive(Debug)]
struct EntryForm {
    opened_on: NaiveDate,
}

#[derive(Debug)]
enum FormState {
    Closed,
    Open(EntryForm),
}

impl FormState {
    fn status(&self) -> FormStatus {
        match self {
            FormState::Closed => FormStatus::FormClosed,
            FormState::Open(_) => FormStatus::FormOpen,
        }
    }
}

struct ViewState {
    form: FormState,
    /// Notifications waiting to be shown
    notices: Vec<Notice>,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("The entry form is not open")]
    FormClosed,

    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::FormClosed => AppError::Conflict(err.to_string()),
            SubmitError::Invalid(errors) => AppError::Validation(errors),
        }
    }
}

/// One dashboard card.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MetricCard {
    pub metric: MetricName,
    pub title: &'static str,
    /// Display value ("8,432")
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<&'static str>,
    /// Percent of goal; absent for range-based metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    pub caption: String,
    pub trend: Trend,
}

/// One trend chart tab.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ChartData {
    pub metric: String,
    pub label: String,
    pub color: &'static str,
    pub points: Vec<HistoryPoint>,
    /// Flat goal line, one value per point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_line: Option<Vec<f64>>,
}

/// Weak reference to a view for work that finishes after an await.
///
/// Anything applied through it is discarded once the view is unmounted.
#[derive(Clone)]
pub struct ViewHandle {
    state: Weak<Mutex<ViewState>>,
}

impl ViewHandle {
    pub fn is_mounted(&self) -> bool {
        self.state.strong_count() > 0
    }

    /// Queue a notification on the view. Returns `false` if it is gone.
    pub fn notify(&self, notice: Notice) -> bool {
        match self.state.upgrade() {
            Some(state) => {
                lock(&state).notices.push(notice);
                true
            }
            None => false,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct DashboardView {
    state: Arc<Mutex<ViewState>>,
    snapshot: SharedSnapshot,
    history: HistoryProvider,
    refresh: RefreshTimer,
}

impl DashboardView {
    /// Mount a fresh view and start its refresh timer.
    ///
    /// Must be called within a tokio runtime.
    pub fn mount(options: &ViewOptions) -> Self {
        let snapshot: SharedSnapshot = Arc::new(Mutex::new(MetricSnapshotModel::initial()));
        let refresh = spawn_refresh(
            &snapshot,
            options.refresh_interval,
            options.increments.clone(),
        );
        tracing::debug!(interval = ?options.refresh_interval, "Dashboard mounted");

        Self {
            state: Arc::new(Mutex::new(ViewState {
                form: FormState::Closed,
                notices: Vec::new(),
            })),
            snapshot,
            history: HistoryProvider::new(),
            refresh,
        }
    }

    pub fn handle(&self) -> ViewHandle {
        ViewHandle {
            state: Arc::downgrade(&self.state),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresh.is_running()
    }

    pub fn form_status(&self) -> FormStatus {
        lock(&self.state).form.status()
    }

    /// The "Add Health Data" / "Close Form" button.
    pub fn toggle_form(&self, today: NaiveDate) -> FormStatus {
        let mut state = lock(&self.state);
        state.form = match state.form {
            FormState::Closed => FormState::Open(EntryForm { opened_on: today }),
            FormState::Open(_) => FormState::Closed,
        };
        state.form.status()
    }

    pub fn cancel_form(&self) -> FormStatus {
        let mut state = lock(&self.state);
        state.form = FormState::Closed;
        state.form.status()
    }

    /// Submit the entry form.
    ///
    /// Valid entries are acknowledged and close the form. Values are not
    /// stored anywhere and the snapshot is left untouched. Invalid entries
    /// leave the form open.
    pub fn submit_entry(&self, entry: &HealthEntry, today: NaiveDate) -> Result<Notice, SubmitError> {
        let mut state = lock(&self.state);
        let FormState::Open(form) = &state.form else {
            return Err(SubmitError::FormClosed);
        };

        let default_date = form.opened_on;
        entry.check(today)?;

        let date = entry.date.unwrap_or(default_date);
        tracing::info!(
            %date,
            steps = ?entry.steps,
            heart_rate = ?entry.heart_rate,
            sleep_hours = ?entry.sleep_hours,
            water_intake = ?entry.water_intake,
            "Health data entry acknowledged"
        );

        state.form = FormState::Closed;
        Ok(Notice::success(format!(
            "Data for {} has been recorded.",
            format_long_date(date)
        )))
    }

    /// Copy of the current snapshot.
    pub fn snapshot(&self) -> MetricSnapshotModel {
        lock(&self.snapshot).clone()
    }

    /// Cards for every metric, in display order.
    pub fn cards(&self) -> Vec<MetricCard> {
        let snapshot = self.snapshot();
        MetricName::ALL
            .into_iter()
            .map(|metric| build_card(metric, &snapshot))
            .collect()
    }

    /// Chart data for a tab. Unknown metric names chart as zeros.
    pub fn chart(&self, metric: &str, today: NaiveDate) -> ChartData {
        let points = self.history.history(metric, today);
        let tab = metric.parse::<MetricName>().ok();

        ChartData {
            metric: metric.to_string(),
            label: capitalize(metric),
            color: tab.map(|m| m.chart_color()).unwrap_or(DEFAULT_CHART_COLOR),
            goal_line: tab.map(|m| vec![m.chart_goal(); points.len()]),
            points,
        }
    }

    /// Drain queued notifications.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut lock(&self.state).notices)
    }
}

impl Drop for DashboardView {
    fn drop(&mut self) {
        tracing::debug!("Dashboard unmounted");
    }
}

fn build_card(metric: MetricName, snapshot: &MetricSnapshotModel) -> MetricCard {
    let entry = snapshot.get(metric);
    let progress = entry.progress();
    let percent = progress.unwrap_or_default();

    let (title, value, unit, caption) = match (metric, entry.target) {
        (MetricName::HeartRate, Target::Range { low, high }) => (
            "Heart Rate",
            format_number(entry.current),
            Some("BPM"),
            format!("Normal range: {}-{} BPM", low, high),
        ),
        (MetricName::Steps, _) => (
            "Steps",
            group_thousands(entry.current),
            None,
            format!("{}% of daily goal", percent),
        ),
        (MetricName::Sleep, _) => (
            "Sleep",
            format_number(entry.current),
            Some("hrs"),
            format!("{}% of target", percent),
        ),
        (MetricName::Water, _) => (
            "Water Intake",
            format_number(entry.current),
            Some("ml"),
            format!("{}% of daily goal", percent),
        ),
        (MetricName::HeartRate, Target::Goal(_)) => (
            "Heart Rate",
            format_number(entry.current),
            Some("BPM"),
            format!("{}% of target", percent),
        ),
    };

    MetricCard {
        metric,
        title,
        value,
        unit,
        progress,
        caption,
        trend: entry.trend,
    }
}

fn format_number(value: f64) -> String {
    format!("{}", value)
}

/// Whole number with comma thousands separators ("10,254").
fn group_thousands(value: f64) -> String {
    let digits = (value.round() as i64).unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value.round() < 0.0 {
        grouped.insert(0, '-');
    }
    grouped
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::snapshot::FixedIncrement;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    fn options() -> ViewOptions {
        ViewOptions::new(Duration::from_secs(5)).with_increments(Arc::new(FixedIncrement(2.0)))
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(8432.0), "8,432");
        assert_eq!(group_thousands(100000.0), "100,000");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1234567.0), "1,234,567");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("heartRate"), "HeartRate");
        assert_eq!(capitalize(""), "");
    }

    #[tokio::test]
    async fn test_cards_from_initial_snapshot() {
        let view = DashboardView::mount(&options());
        let cards = view.cards();

        assert_eq!(cards.len(), 4);
        assert_eq!(cards[0].value, "8,432");
        assert_eq!(cards[0].caption, "84% of daily goal");
        assert_eq!(cards[1].value, "68");
        assert_eq!(cards[1].caption, "Normal range: 60-100 BPM");
        assert_eq!(cards[1].progress, None);
        assert_eq!(cards[2].value, "7.5");
        assert_eq!(cards[2].caption, "94% of target");
        assert_eq!(cards[3].caption, "90% of daily goal");
    }

    #[tokio::test]
    async fn test_toggle_twice_closes_form() {
        let view = DashboardView::mount(&options());
        assert_eq!(view.form_status(), FormStatus::FormClosed);
        assert_eq!(view.toggle_form(today()), FormStatus::FormOpen);
        assert_eq!(view.toggle_form(today()), FormStatus::FormClosed);

        // No draft survives the round trip
        assert!(matches!(
            view.submit_entry(&HealthEntry::default(), today()),
            Err(SubmitError::FormClosed)
        ));
    }

    #[tokio::test]
    async fn test_invalid_submit_keeps_form_open() {
        let view = DashboardView::mount(&options());
        view.toggle_form(today());
        let before = view.snapshot();

        let entry = HealthEntry {
            heart_rate: Some(250.0),
            ..Default::default()
        };
        let result = view.submit_entry(&entry, today());

        assert!(matches!(result, Err(SubmitError::Invalid(_))));
        assert_eq!(view.form_status(), FormStatus::FormOpen);
        assert_eq!(view.snapshot(), before);
    }

    #[tokio::test]
    async fn test_valid_submit_acknowledges_and_closes() {
        let view = DashboardView::mount(&options());
        view.toggle_form(today());

        let entry = HealthEntry {
            steps: Some(12000.0),
            ..Default::default()
        };
        let notice = view.submit_entry(&entry, today()).unwrap();

        assert_eq!(notice.title, "Data for March 14th, 2026 has been recorded.");
        assert_eq!(view.form_status(), FormStatus::FormClosed);
        // Entries are acknowledged only
        assert_eq!(view.snapshot(), MetricSnapshotModel::initial());
    }

    #[tokio::test]
    async fn test_cancel_closes_form() {
        let view = DashboardView::mount(&options());
        view.toggle_form(today());
        assert_eq!(view.cancel_form(), FormStatus::FormClosed);
    }

    #[tokio::test]
    async fn test_chart_tabs() {
        let view = DashboardView::mount(&options());

        let steps = view.chart("steps", today());
        assert_eq!(steps.color, "#22c55e");
        assert_eq!(steps.goal_line, Some(vec![10000.0; 7]));
        assert_eq!(steps.label, "Steps");

        let calories = view.chart("calories", today());
        assert_eq!(calories.goal_line, None);
        assert_eq!(calories.points.len(), 7);
    }

    #[tokio::test]
    async fn test_handle_discards_after_unmount() {
        let view = DashboardView::mount(&options());
        let handle = view.handle();

        assert!(handle.notify(Notice::success("first")));
        assert_eq!(view.take_notices().len(), 1);
        assert!(view.take_notices().is_empty());

        drop(view);
        assert!(!handle.is_mounted());
        assert!(!handle.notify(Notice::success("late")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mounted_view_refreshes_steps() {
        let view = DashboardView::mount(&options());
        tokio::time::sleep(Duration::from_millis(10_100)).await;
        assert_eq!(view.snapshot().get(MetricName::Steps).current, 8436.0);
        assert!(view.is_refreshing());
    }
}
