//! Calendar marking builder.
//!
//! Produces the date-to-marking map consumed by the calendar widget. Three
//! layers are applied in order, later layers overriding earlier ones per day:
//!
//! 1. **Phase blocks**: contiguous menstruation and ovulation runs between the
//!    last period start and the predicted next period. Manually logged period
//!    days replace the model's menstruation run.
//! 2. **Activity dots**: days whose log carries mood, notes, or symptoms.
//! 3. **Selection**: the selected day or the in-progress edit range.
//!
//! ## Usage
//!
//! ```
//! use chrono::{NaiveDate, Utc};
//! use luna_core::calendar::{build_markings, CalendarRange, Selection};
//! use luna_core::model::UserProfile;
//!
//! let start = NaiveDate::from_ymd_opt(2025, 10, 1).unwrap();
//! let profile = UserProfile::new("1", "Maria", start, 28, Utc::now());
//! let range = CalendarRange::new(start, NaiveDate::from_ymd_opt(2027, 12, 31).unwrap());
//!
//! let marks = build_markings(Some(&profile), &[], &Selection::None, &range);
//! assert!(marks.get(start).unwrap().starting_day);
//! ```

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::model::{DailyLog, Phase, UserProfile};
use crate::phase::{compute_status, predicted_next_period, LOST_CYCLE_MAX_DAY};

/// Accent color: activity dots and selection fill.
pub const PRIMARY_COLOR: &str = "#A855F7";

/// Text color on a selected day.
pub const SELECTED_TEXT_COLOR: &str = "#FFFFFF";

/// Text color on phase blocks.
pub const PHASE_TEXT_COLOR: &str = "#1F1F1F";

/// Calendar fill for a phase.
pub fn phase_color(phase: Phase) -> &'static str {
    match phase {
        Phase::Menstruation => "#FFE4E9",
        Phase::Follicular => "#FFE9F7",
        Phase::Ovulation => "#E3FFE8",
        Phase::Luteal => "#FFF6D9",
    }
}

/// Inclusive date window the calendar renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CalendarRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Clamps `date` into the window; used for the initially shown month.
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.start, self.end.max(self.start))
    }
}

/// Visual marking for one day.
///
/// Block entries use `starting_day`/`ending_day`/`color`/`text_color`;
/// activity entries use `marked`/`dot_color`. A day may carry both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayMarking {
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub starting_day: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ending_day: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<&'static str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub marked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dot_color: Option<&'static str>,
}

impl DayMarking {
    /// True if the day is drawn as part of a colored block.
    pub fn is_block(&self) -> bool {
        self.color.is_some()
    }
}

/// What the user currently has highlighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    None,
    /// A single tapped day.
    Day(NaiveDate),
    /// An in-progress period range edit.
    Range {
        start: NaiveDate,
        end: Option<NaiveDate>,
    },
}

/// Date-keyed markings, serialized with ISO-8601 keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MarkedDates(BTreeMap<NaiveDate, DayMarking>);

impl MarkedDates {
    pub fn get(&self, date: NaiveDate) -> Option<&DayMarking> {
        self.0.get(&date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &DayMarking)> {
        self.0.iter()
    }

    /// JSON object in the shape the calendar widget expects.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn entry(&mut self, date: NaiveDate) -> &mut DayMarking {
        self.0.entry(date).or_default()
    }
}

/// Splits a date set into maximal runs of consecutive days.
///
/// Input order does not matter; duplicates collapse.
pub fn group_consecutive(dates: &[NaiveDate]) -> Vec<Vec<NaiveDate>> {
    let mut sorted = dates.to_vec();
    sorted.sort();
    sorted.dedup();

    let mut runs: Vec<Vec<NaiveDate>> = Vec::new();
    for date in sorted {
        match runs.last_mut() {
            Some(run) if run.last().and_then(|d| d.succ_opt()) == Some(date) => run.push(date),
            _ => runs.push(vec![date]),
        }
    }
    runs
}

/// Builds the full marking map for the calendar.
pub fn build_markings(
    profile: Option<&UserProfile>,
    logs: &[DailyLog],
    selection: &Selection,
    range: &CalendarRange,
) -> MarkedDates {
    let mut marks = MarkedDates::default();

    if let Some(profile) = profile {
        apply_phase_layer(&mut marks, profile, logs, range);
    }
    apply_activity_layer(&mut marks, logs, range);
    apply_selection_layer(&mut marks, selection, range);

    debug!(days = marks.len(), "Built calendar markings");
    marks
}

fn apply_phase_layer(
    marks: &mut MarkedDates,
    profile: &UserProfile,
    logs: &[DailyLog],
    range: &CalendarRange,
) {
    let (Some(last_period), Some(next_period)) =
        (profile.last_period_date, predicted_next_period(profile))
    else {
        return;
    };

    // Predictions stop at the lost-cycle ceiling, so never walk past it.
    let ceiling = last_period + Duration::days(LOST_CYCLE_MAX_DAY);
    let first = last_period.max(range.start);
    let stop = next_period.min(ceiling);

    let mut menstruation = Vec::new();
    let mut ovulation = Vec::new();
    for date in first.iter_days().take_while(|d| *d < stop && *d <= range.end) {
        match compute_status(profile, date).map(|s| s.phase) {
            Some(Phase::Menstruation) => menstruation.push(date),
            Some(Phase::Ovulation) => ovulation.push(date),
            _ => {}
        }
    }

    let manual: Vec<NaiveDate> = logs
        .iter()
        .filter(|log| log.is_period_day)
        .map(|log| log.date)
        .filter(|d| *d >= last_period && *d < next_period && range.contains(*d))
        .collect();
    if !manual.is_empty() {
        menstruation = manual;
    }

    // Logged period days win over predicted ovulation; the rest of the
    // ovulation run is regrouped so each piece gets its own caps.
    ovulation.retain(|d| !menstruation.contains(d));
    for run in group_consecutive(&ovulation) {
        apply_block(marks, &run, phase_color(Phase::Ovulation));
    }
    for run in group_consecutive(&menstruation) {
        apply_block(marks, &run, phase_color(Phase::Menstruation));
    }
}

fn apply_block(marks: &mut MarkedDates, run: &[NaiveDate], color: &'static str) {
    let last = run.len().saturating_sub(1);
    for (i, date) in run.iter().enumerate() {
        let marking = marks.entry(*date);
        marking.starting_day = i == 0;
        marking.ending_day = i == last;
        marking.color = Some(color);
        marking.text_color = Some(PHASE_TEXT_COLOR);
    }
}

fn apply_activity_layer(marks: &mut MarkedDates, logs: &[DailyLog], range: &CalendarRange) {
    for log in logs.iter().filter(|l| l.has_activity() && range.contains(l.date)) {
        let marking = marks.entry(log.date);
        marking.marked = true;
        marking.dot_color = Some(PRIMARY_COLOR);
    }
}

fn apply_selection_layer(marks: &mut MarkedDates, selection: &Selection, range: &CalendarRange) {
    match *selection {
        Selection::None => {}
        Selection::Day(date) => {
            if !range.contains(date) {
                return;
            }
            let marking = marks.entry(date);
            if !marking.is_block() {
                marking.starting_day = true;
                marking.ending_day = true;
            }
            highlight(marking);
        }
        Selection::Range { start, end } => {
            let end = end.unwrap_or(start).max(start);
            for date in start.iter_days().take_while(|d| *d <= end) {
                if !range.contains(date) {
                    continue;
                }
                let marking = marks.entry(date);
                marking.starting_day = date == start;
                marking.ending_day = date == end;
                highlight(marking);
            }
        }
    }
}

fn highlight(marking: &mut DayMarking) {
    marking.color = Some(PRIMARY_COLOR);
    marking.text_color = Some(SELECTED_TEXT_COLOR);
}

/// The Monday-first week containing `date`.
pub fn week_days(date: NaiveDate) -> [NaiveDate; 7] {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

/// Fraction of the cycle elapsed, in `[0, 1]`.
pub fn cycle_progress(current_day: i64, total_days: u32) -> f64 {
    let total = f64::from(total_days.max(1));
    (current_day as f64 / total).clamp(0.0, 1.0)
}
