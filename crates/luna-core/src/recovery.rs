//! Lost-cycle recovery detection.
//!
//! Once the elapsed time since the last period start runs well past the
//! average cycle length, the home screen swaps the status card for a prompt
//! asking whether a new period has started. This module decides which card to
//! show; applying the user's answer is a store concern.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{CycleStatus, DailyLog, UserProfile};
use crate::phase::{compute_status, days_between};

/// Days past the average cycle length before the prompt is offered.
pub const RECOVERY_THRESHOLD_DAYS: i64 = 3;

/// Window (past the average cycle length) in which a manually logged period
/// day counts as confirmation of the current cycle.
pub const CONFIRMATION_WINDOW_EXTRA_DAYS: i64 = 1;

/// Waiting and suppression flags consulted by the detector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryFlags {
    /// The user answered "no period yet"; show the waiting card until a new
    /// period start is logged.
    pub is_waiting_for_next_period: bool,
    /// Anchor date for which the prompt was already dismissed. Session-only.
    pub recovery_suppressed_for_start_date: Option<NaiveDate>,
}

/// What the home screen should show in place of (or as) the status card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HomeView {
    /// No profile, or onboarding not finished.
    NotOnboarded,
    /// The user said no period yet; normal phase display is suppressed.
    Waiting,
    /// Ask the user to confirm whether a period has started.
    RecoveryPrompt,
    /// Normal status card.
    Status(CycleStatus),
    /// Profile is set but no trustworthy prediction exists.
    NoPrediction,
}

/// The user's answer to the recovery prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// A period started on the given date.
    PeriodStarted(NaiveDate),
    /// No period yet.
    NoPeriodYet,
}

/// True if a period-day log confirms the cycle anchored at `last_period`.
fn has_confirmed_period(logs: &[DailyLog], last_period: NaiveDate, cycle_length: i64) -> bool {
    let window = cycle_length + CONFIRMATION_WINDOW_EXTRA_DAYS;
    logs.iter().any(|log| {
        let offset = days_between(last_period, log.date);
        log.is_period_day && (0..=window).contains(&offset)
    })
}

/// Decides whether the recovery prompt should be shown.
///
/// All of the following must hold:
/// 1. the profile has an anchor date;
/// 2. the user is not already waiting for the next period;
/// 3. the prompt was not dismissed for this anchor date;
/// 4. no period-day log falls within `average_cycle_length + 1` days on or
///    after the anchor;
/// 5. more than `average_cycle_length + 3` days have elapsed.
pub fn should_show_recovery(
    profile: &UserProfile,
    logs: &[DailyLog],
    flags: &RecoveryFlags,
    today: NaiveDate,
) -> bool {
    let Some(last_period) = profile.last_period_date else {
        return false;
    };

    if flags.is_waiting_for_next_period {
        return false;
    }

    if flags.recovery_suppressed_for_start_date == Some(last_period) {
        return false;
    }

    let cycle_length = profile.cycle_length_days();
    if has_confirmed_period(logs, last_period, cycle_length) {
        return false;
    }

    days_between(last_period, today) > cycle_length + RECOVERY_THRESHOLD_DAYS
}

/// Resolves the home screen view for `today`.
pub fn home_view(
    profile: Option<&UserProfile>,
    logs: &[DailyLog],
    flags: &RecoveryFlags,
    today: NaiveDate,
) -> HomeView {
    let Some(profile) = profile.filter(|p| p.onboarding_completed) else {
        return HomeView::NotOnboarded;
    };

    if profile.last_period_date.is_some() && flags.is_waiting_for_next_period {
        return HomeView::Waiting;
    }

    if should_show_recovery(profile, logs, flags, today) {
        return HomeView::RecoveryPrompt;
    }

    match compute_status(profile, today) {
        Some(status) => HomeView::Status(status),
        None => HomeView::NoPrediction,
    }
}

/// Clamps a recovery start date into `[last_period, today]`.
pub fn clamp_recovery_date(date: NaiveDate, last_period: NaiveDate, today: NaiveDate) -> NaiveDate {
    if date < last_period {
        last_period
    } else if date > today {
        today
    } else {
        date
    }
}
