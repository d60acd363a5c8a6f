//! Phase calculation and next-period prediction.
//!
//! Two boundary models live here and are kept apart on purpose:
//!
//! - [`compute_status`] classifies days with fixed thresholds
//!   (1-5 menstruation, 6-13 follicular, 14-17 ovulation, 18+ luteal)
//!   regardless of cycle length.
//! - [`days_until_phase_end`] places ovulation relative to the cycle length
//!   (`length - 14`), so for cycles far from 28 days the two disagree.

use chrono::{Duration, NaiveDate};

use crate::model::{CycleStatus, Phase, UserProfile};

/// Fixed menstruation window length.
pub const PERIOD_LENGTH: i64 = 5;

/// Last day of the follicular phase.
pub const FOLLICULAR_END_DAY: i64 = 13;

/// Last day of the ovulation phase.
pub const OVULATION_END_DAY: i64 = 17;

/// First day of the fertile window.
pub const FERTILE_START_DAY: i64 = 10;

/// Luteal phase length, assumed constant.
pub const LUTEAL_PHASE_LENGTH: i64 = 14;

/// Days past the average cycle length before predictions are dropped.
pub const LOST_CYCLE_GRACE_DAYS: i64 = 5;

/// Absolute cycle-day ceiling for predictions.
pub const LOST_CYCLE_MAX_DAY: i64 = 40;

/// Whole days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Computes the cycle status at `reference`.
///
/// Returns `None` when the profile has no anchor date, when `reference` is
/// before the anchor, or when the cycle is lost: the 1-based cycle day is past
/// `average_cycle_length + 5` or past day 40.
pub fn compute_status(profile: &UserProfile, reference: NaiveDate) -> Option<CycleStatus> {
    let last_period = profile.last_period_date?;
    let current_day = days_between(last_period, reference) + 1;

    if current_day < 1 {
        return None;
    }

    let cycle_length = profile.cycle_length_days();
    if current_day > cycle_length + LOST_CYCLE_GRACE_DAYS || current_day > LOST_CYCLE_MAX_DAY {
        return None;
    }

    let phase = phase_for_day(current_day);

    Some(CycleStatus {
        current_day,
        phase,
        phase_display_name: phase.display_name(current_day),
        is_period_active: current_day <= PERIOD_LENGTH,
        days_until_next_period: (cycle_length - current_day).max(0),
        is_pregnancy_possible: (FERTILE_START_DAY..=OVULATION_END_DAY).contains(&current_day),
    })
}

/// Fixed-threshold phase for a 1-based cycle day.
pub fn phase_for_day(current_day: i64) -> Phase {
    if current_day <= PERIOD_LENGTH {
        Phase::Menstruation
    } else if current_day <= FOLLICULAR_END_DAY {
        Phase::Follicular
    } else if current_day <= OVULATION_END_DAY {
        Phase::Ovulation
    } else {
        Phase::Luteal
    }
}

/// Predicted start of the next period: anchor + average cycle length.
pub fn predicted_next_period(profile: &UserProfile) -> Option<NaiveDate> {
    let last_period = profile.last_period_date?;
    last_period.checked_add_signed(Duration::days(profile.cycle_length_days()))
}

/// Expected ovulation: 14 days before the predicted next period.
pub fn expected_ovulation_date(profile: &UserProfile) -> Option<NaiveDate> {
    predicted_next_period(profile)?.checked_sub_signed(Duration::days(LUTEAL_PHASE_LENGTH))
}

/// Phase boundaries scaled to a cycle length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseBoundaries {
    pub menstruation_end: i64,
    pub follicular_end: i64,
    pub ovulation_start: i64,
    pub ovulation_end: i64,
    pub luteal_end: i64,
}

impl PhaseBoundaries {
    /// Boundaries for a cycle of `cycle_length` days.
    ///
    /// Ovulation is centered on `cycle_length - 14` with one day either side,
    /// kept after the menstruation window and within the cycle.
    pub fn for_cycle_length(cycle_length: i64) -> Option<Self> {
        if cycle_length <= 0 {
            return None;
        }

        let center = cycle_length - LUTEAL_PHASE_LENGTH;
        let ovulation_start = (center - 1).max(PERIOD_LENGTH + 1);
        let ovulation_end = (center + 1).max(ovulation_start).min(cycle_length);

        Some(Self {
            menstruation_end: PERIOD_LENGTH,
            follicular_end: ovulation_start - 1,
            ovulation_start,
            ovulation_end,
            luteal_end: cycle_length,
        })
    }

    /// Last day of `phase` under these boundaries.
    pub fn end_of(&self, phase: Phase) -> i64 {
        match phase {
            Phase::Menstruation => self.menstruation_end,
            Phase::Follicular => self.follicular_end,
            Phase::Ovulation => self.ovulation_end,
            Phase::Luteal => self.luteal_end,
        }
    }
}

/// Days left until the current phase ends, using cycle-length-relative
/// boundaries. Clamped to 0.
pub fn days_until_phase_end(status: &CycleStatus, profile: &UserProfile) -> Option<i64> {
    if status.current_day <= 0 {
        return None;
    }
    let boundaries = PhaseBoundaries::for_cycle_length(profile.cycle_length_days())?;
    Some((boundaries.end_of(status.phase) - status.current_day).max(0))
}
