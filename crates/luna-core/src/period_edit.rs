//! Period range editing.
//!
//! The calendar lets the user redraw the current period as a start/end range.
//! [`PeriodEditor`] tracks the taps; [`apply_period_range`] produces the log
//! set that results from saving.
//!
//! ## States
//!
//! - **Idle**: no edit in progress; taps are ordinary day selections.
//! - **Editing**: taps build a start/end range.
//!
//! ## Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use luna_core::period_edit::PeriodEditor;
//!
//! let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
//! let mut editor = PeriodEditor::new();
//! editor.begin();
//! editor.tap(NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
//! editor.tap(NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());
//!
//! assert!(editor.can_save());
//! let range = editor.validate(today, 90).unwrap();
//! assert_eq!(range.len(), 4);
//! ```

use chrono::{Duration, NaiveDate};
use thiserror::Error;

use crate::calendar::Selection;
use crate::model::{DailyLog, LogPatch};

/// Period range rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Start or end not chosen yet.
    #[error("select both the first and the last day of the period")]
    Incomplete,

    /// End precedes start.
    #[error("the last day cannot be before the first day")]
    EndBeforeStart,

    /// A date lies after today.
    #[error("period dates cannot be in the future")]
    InFuture,

    /// A date lies before the edit window.
    #[error("period dates must be within the last {0} days")]
    TooOld(i64),
}

/// Result type for period edits.
pub type Result<T> = std::result::Result<T, EditError>;

/// Editor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    },
}

/// Validated inclusive period range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PeriodRange {
    /// Number of days in the range.
    pub fn len(&self) -> usize {
        usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Every date in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Tap-driven state machine for redrawing the period.
#[derive(Debug, Clone, Default)]
pub struct PeriodEditor {
    state: EditState,
}

impl PeriodEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EditState::Editing { .. })
    }

    /// Enters editing with an empty selection.
    pub fn begin(&mut self) {
        self.state = EditState::Editing {
            start: None,
            end: None,
        };
    }

    /// Handles a day tap. Ignored while idle.
    pub fn tap(&mut self, date: NaiveDate) {
        let EditState::Editing { start, end } = self.state else {
            return;
        };

        self.state = match (start, end) {
            (Some(start), None) if date >= start => EditState::Editing {
                start: Some(start),
                end: Some(date),
            },
            _ => EditState::Editing {
                start: Some(date),
                end: None,
            },
        };
    }

    /// True once both ends are chosen in order.
    pub fn can_save(&self) -> bool {
        matches!(
            self.state,
            EditState::Editing { start: Some(start), end: Some(end) } if end >= start
        )
    }

    /// Drops the selection and returns to idle.
    pub fn cancel(&mut self) {
        self.state = EditState::Idle;
    }

    /// The in-progress range as a calendar selection.
    pub fn selection(&self) -> Selection {
        match self.state {
            EditState::Editing {
                start: Some(start),
                end,
            } => Selection::Range { start, end },
            _ => Selection::None,
        }
    }

    /// Checks the selection against `today` and the edit window.
    ///
    /// Both dates must fall in `[today - window_days, today]`.
    pub fn validate(&self, today: NaiveDate, window_days: i64) -> Result<PeriodRange> {
        let EditState::Editing {
            start: Some(start),
            end: Some(end),
        } = self.state
        else {
            return Err(EditError::Incomplete);
        };

        if end < start {
            return Err(EditError::EndBeforeStart);
        }
        if end > today {
            return Err(EditError::InFuture);
        }
        if start < edit_window_start(today, window_days) {
            return Err(EditError::TooOld(window_days));
        }

        Ok(PeriodRange { start, end })
    }
}

/// First date an edit may touch.
pub fn edit_window_start(today: NaiveDate, window_days: i64) -> NaiveDate {
    Duration::try_days(window_days)
        .and_then(|window| today.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN)
}

/// Returns `logs` with the period redrawn as `range`.
///
/// Every log inside the edit window loses its period flag and flow; each day of
/// `range` is then flagged, creating logs through `new_id` where missing.
pub fn apply_period_range<F>(
    logs: &[DailyLog],
    range: &PeriodRange,
    today: NaiveDate,
    window_days: i64,
    mut new_id: F,
) -> Vec<DailyLog>
where
    F: FnMut(NaiveDate) -> String,
{
    let window_start = edit_window_start(today, window_days);
    let clear = LogPatch::new().period_day(false).flow(None);
    let flag = LogPatch::new().period_day(true);

    let mut result: Vec<DailyLog> = logs
        .iter()
        .cloned()
        .map(|log| {
            let log = if log.date >= window_start && log.date <= today {
                log.apply(&clear)
            } else {
                log
            };
            if range.contains(log.date) {
                log.apply(&flag)
            } else {
                log
            }
        })
        .collect();

    for date in range.days() {
        if !result.iter().any(|log| log.date == date) {
            result.push(DailyLog::new(new_id(date), date).apply(&flag));
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Flow, Mood};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn editing(start: NaiveDate, end: NaiveDate) -> PeriodEditor {
        let mut editor = PeriodEditor::new();
        editor.begin();
        editor.tap(start);
        editor.tap(end);
        editor
    }

    // ==================== State Machine Tests ====================

    #[test]
    fn starts_idle_and_ignores_taps() {
        let mut editor = PeriodEditor::new();
        editor.tap(date(2025, 3, 5));
        assert_eq!(editor.state(), EditState::Idle);
        assert!(!editor.can_save());
        assert_eq!(editor.selection(), Selection::None);
    }

    #[test]
    fn begin_clears_previous_selection() {
        let mut editor = editing(date(2025, 3, 5), date(2025, 3, 8));
        editor.begin();
        assert_eq!(
            editor.state(),
            EditState::Editing {
                start: None,
                end: None
            }
        );
    }

    #[test]
    fn tap_sequence() {
        let mut editor = PeriodEditor::new();
        editor.begin();

        editor.tap(date(2025, 3, 5));
        assert!(!editor.can_save());

        // Earlier day restarts the selection.
        editor.tap(date(2025, 3, 3));
        assert_eq!(
            editor.state(),
            EditState::Editing {
                start: Some(date(2025, 3, 3)),
                end: None
            }
        );

        editor.tap(date(2025, 3, 6));
        assert!(editor.can_save());

        // With both set, the next tap starts over.
        editor.tap(date(2025, 3, 10));
        assert_eq!(
            editor.state(),
            EditState::Editing {
                start: Some(date(2025, 3, 10)),
                end: None
            }
        );
    }

    #[test]
    fn same_day_range_is_saveable() {
        let editor = editing(date(2025, 3, 5), date(2025, 3, 5));
        assert!(editor.can_save());
        assert_eq!(
            editor.selection(),
            Selection::Range {
                start: date(2025, 3, 5),
                end: Some(date(2025, 3, 5))
            }
        );
    }

    #[test]
    fn cancel_returns_to_idle() {
        let mut editor = editing(date(2025, 3, 5), date(2025, 3, 8));
        editor.cancel();
        assert!(!editor.is_editing());
        assert_eq!(editor.selection(), Selection::None);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn validate_rejects_incomplete_future_and_old() {
        let today = date(2025, 3, 20);

        let mut editor = PeriodEditor::new();
        editor.begin();
        editor.tap(date(2025, 3, 5));
        assert_eq!(editor.validate(today, 90), Err(EditError::Incomplete));

        let editor = editing(date(2025, 3, 18), date(2025, 3, 21));
        assert_eq!(editor.validate(today, 90), Err(EditError::InFuture));

        let editor = editing(date(2024, 12, 19), date(2024, 12, 22));
        assert_eq!(editor.validate(today, 90), Err(EditError::TooOld(90)));

        // Exactly 90 days back is allowed.
        let editor = editing(date(2024, 12, 20), date(2024, 12, 22));
        assert!(editor.validate(today, 90).is_ok());
    }

    #[test]
    fn huge_window_reaches_back_to_the_earliest_date() {
        let today = date(2025, 3, 20);
        assert_eq!(edit_window_start(today, i64::MAX / 1000), NaiveDate::MIN);

        let editor = editing(date(1900, 1, 1), date(1900, 1, 3));
        assert!(editor.validate(today, i64::MAX / 1000).is_ok());

        let logs = vec![DailyLog::new("a", date(1900, 1, 2)).apply(&LogPatch::new().period_day(true))];
        let range = PeriodRange {
            start: date(2025, 3, 1),
            end: date(2025, 3, 1),
        };
        let result = apply_period_range(&logs, &range, today, i64::MAX, |d| d.to_string());
        assert!(!result.iter().find(|l| l.id == "a").unwrap().is_period_day);
    }

    #[test]
    fn validate_returns_range() {
        let range = editing(date(2025, 3, 5), date(2025, 3, 8))
            .validate(date(2025, 3, 20), 90)
            .unwrap();
        assert_eq!(range.start, date(2025, 3, 5));
        assert_eq!(range.len(), 4);
        assert_eq!(range.days().last(), Some(date(2025, 3, 8)));
    }

    // ==================== apply_period_range Tests ====================

    #[test]
    fn redraws_period_within_window() {
        let today = date(2025, 3, 20);
        let old_period = DailyLog::new("old", date(2025, 2, 3))
            .apply(&LogPatch::new().period_day(true).flow(Some(Flow::Heavy)));
        let ancient = DailyLog::new("ancient", date(2024, 11, 1)).apply(&LogPatch::new().period_day(true));
        let mood_day = DailyLog::new("mood", date(2025, 3, 6)).apply(&LogPatch::new().mood(Some(Mood::Sad)));

        let range = PeriodRange {
            start: date(2025, 3, 5),
            end: date(2025, 3, 8),
        };
        let logs = apply_period_range(&[old_period, ancient, mood_day], &range, today, 90, |d| {
            format!("new-{d}")
        });

        let by_date = |d: NaiveDate| logs.iter().find(|l| l.date == d).unwrap();

        let cleared = by_date(date(2025, 2, 3));
        assert!(!cleared.is_period_day);
        assert_eq!(cleared.flow, None);

        // Outside the window stays untouched.
        assert!(by_date(date(2024, 11, 1)).is_period_day);

        let merged = by_date(date(2025, 3, 6));
        assert!(merged.is_period_day);
        assert_eq!(merged.mood, Some(Mood::Sad));
        assert_eq!(merged.id, "mood");

        for d in range.days() {
            assert!(by_date(d).is_period_day);
        }
        assert_eq!(by_date(date(2025, 3, 5)).id, "new-2025-03-05");
        assert_eq!(logs.len(), 6);
    }
}
