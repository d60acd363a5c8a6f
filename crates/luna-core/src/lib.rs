//! Luna Core - Cycle prediction, recovery, and calendar logic.
//!
//! This crate is pure: it takes a profile, logs, and a reference date and
//! returns derived values. It handles:
//!
//! - Phase calculation and next-period prediction
//! - Lost-cycle recovery detection
//! - Calendar marking for the multi-year calendar
//! - Period range editing
//! - Onboarding and settings validation
//! - Cycle history statistics
//!
//! Absence of a prediction is `None`, never an error.
//!
//! # Example
//!
//! ```
//! use chrono::{NaiveDate, Utc};
//! use luna_core::{compute_status, Phase, UserProfile};
//!
//! let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let profile = UserProfile::new("1", "Maria", start, 28, Utc::now());
//!
//! let status = compute_status(&profile, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()).unwrap();
//! assert_eq!(status.phase, Phase::Ovulation);
//! assert_eq!(status.days_until_next_period, 13);
//! ```

pub mod calendar;
pub mod config;
pub mod model;
pub mod period_edit;
pub mod phase;
pub mod recovery;
pub mod stats;
pub mod validation;

pub use calendar::{build_markings, CalendarRange, DayMarking, MarkedDates, Selection};
pub use config::AppConfig;
pub use model::{
    Cycle, CyclePatch, CycleStatus, DailyLog, Flow, LogPatch, Mood, OnboardingData, Phase,
    ProfilePatch, UserProfile,
};
pub use period_edit::{EditError, PeriodEditor, PeriodRange};
pub use phase::{compute_status, days_until_phase_end, expected_ovulation_date, predicted_next_period};
pub use recovery::{home_view, should_show_recovery, HomeView, RecoveryAction, RecoveryFlags};
pub use stats::{bleeding_episodes, cycle_stats, BleedingEpisode, CycleStats};
pub use validation::{SettingsInput, ValidationError};
