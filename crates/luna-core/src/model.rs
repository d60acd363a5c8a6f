//! Cycle data model.
//!
//! Pure data shared by every other module: the user profile, daily logs,
//! recorded cycles, and the derived [`CycleStatus`].
//!
//! ## Usage
//!
//! ```
//! use chrono::NaiveDate;
//! use luna_core::model::{DailyLog, LogPatch, Mood};
//!
//! let date = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
//! let log = DailyLog::new("1", date).apply(&LogPatch::new().mood(Some(Mood::Good)));
//!
//! assert_eq!(log.mood, Some(Mood::Good));
//! assert!(!log.is_period_day);
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Name used when the user leaves the name blank.
pub const DEFAULT_USER_NAME: &str = "Пользователь";

/// Cycle length used when onboarding supplies none.
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

/// The user's profile: anchor date and average cycle length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Opaque identifier assigned at onboarding completion.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Gates navigation into the main app.
    pub onboarding_completed: bool,
    /// Start of the most recent period. Anchor for all phase math.
    pub last_period_date: Option<NaiveDate>,
    /// Average cycle length in days.
    pub average_cycle_length: u32,
    /// Creation timestamp, immutable.
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Creates a completed profile.
    pub fn new(
        id: impl Into<String>,
        name: &str,
        last_period_date: NaiveDate,
        average_cycle_length: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: normalize_name(name),
            onboarding_completed: true,
            last_period_date: Some(last_period_date),
            average_cycle_length,
            created_at,
        }
    }

    /// Returns the average cycle length as a signed day count.
    pub fn cycle_length_days(&self) -> i64 {
        i64::from(self.average_cycle_length)
    }

    /// Applies a partial update.
    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(name) = &patch.name {
            self.name = normalize_name(name);
        }
        if let Some(date) = patch.last_period_date {
            self.last_period_date = Some(date);
        }
        if let Some(length) = patch.average_cycle_length {
            self.average_cycle_length = length;
        }
        if let Some(completed) = patch.onboarding_completed {
            self.onboarding_completed = completed;
        }
    }
}

/// Trims a display name, falling back to [`DEFAULT_USER_NAME`].
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_USER_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Partial profile update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub last_period_date: Option<NaiveDate>,
    pub average_cycle_length: Option<u32>,
    pub onboarding_completed: Option<bool>,
}

/// Input collected by the onboarding flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingData {
    pub name: String,
    pub last_period_date: NaiveDate,
    pub average_cycle_length: u32,
}

/// Mood vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Neutral,
    Bad,
    Awful,
    Love,
    Happy,
    Sad,
    Sick,
    Irritated,
    Tired,
    LibidoHigh,
}

impl Mood {
    /// Returns the mood as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Great => "great",
            Self::Good => "good",
            Self::Okay => "okay",
            Self::Neutral => "neutral",
            Self::Bad => "bad",
            Self::Awful => "awful",
            Self::Love => "love",
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Sick => "sick",
            Self::Irritated => "irritated",
            Self::Tired => "tired",
            Self::LibidoHigh => "libido_high",
        }
    }

    /// Parses a mood from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.as_str() == s)
    }

    /// Glyph shown in the week strip.
    pub fn emoji(&self) -> &'static str {
        match self {
            Self::Great => "🥰",
            Self::Good => "😊",
            Self::Okay | Self::Neutral => "😐",
            Self::Bad => "😢",
            Self::Awful | Self::Sad => "😭",
            Self::Love => "😍",
            Self::Happy => "😄",
            Self::Sick => "🤒",
            Self::Irritated => "😤",
            Self::Tired => "🥱",
            Self::LibidoHigh => "🔥",
        }
    }

    /// Returns every mood.
    pub fn all() -> &'static [Mood] {
        &[
            Self::Great,
            Self::Good,
            Self::Okay,
            Self::Neutral,
            Self::Bad,
            Self::Awful,
            Self::Love,
            Self::Happy,
            Self::Sad,
            Self::Sick,
            Self::Irritated,
            Self::Tired,
            Self::LibidoHigh,
        ]
    }
}

impl std::fmt::Display for Mood {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Flow intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Light,
    Medium,
    Heavy,
}

impl Flow {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Heavy => "heavy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "light" => Some(Self::Light),
            "medium" => Some(Self::Medium),
            "heavy" => Some(Self::Heavy),
            _ => None,
        }
    }
}

/// One user-entered record for a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: String,
    /// Natural key: at most one log per date.
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<Flow>,
    /// User-asserted period marker, independent of predicted period days.
    #[serde(default)]
    pub is_period_day: bool,
}

impl DailyLog {
    /// Creates an empty log with `is_period_day = false`.
    pub fn new(id: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: id.into(),
            date,
            mood: None,
            symptoms: None,
            notes: None,
            flow: None,
            is_period_day: false,
        }
    }

    /// Returns this log with the patch merged over it.
    pub fn apply(mut self, patch: &LogPatch) -> Self {
        if let Some(mood) = patch.mood {
            self.mood = mood;
        }
        if let Some(symptoms) = &patch.symptoms {
            self.symptoms = symptoms.clone();
        }
        if let Some(notes) = &patch.notes {
            self.notes = notes.clone();
        }
        if let Some(flow) = patch.flow {
            self.flow = flow;
        }
        if let Some(is_period_day) = patch.is_period_day {
            self.is_period_day = is_period_day;
        }
        self
    }

    /// True when the log carries mood, notes, or at least one symptom.
    pub fn has_activity(&self) -> bool {
        self.mood.is_some()
            || self.notes.as_deref().is_some_and(|n| !n.is_empty())
            || self.symptoms.as_ref().is_some_and(|s| !s.is_empty())
    }
}

/// Partial daily log update.
///
/// The outer `Option` says whether a field is touched; the inner value is what
/// it is set to, so `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPatch {
    pub mood: Option<Option<Mood>>,
    pub symptoms: Option<Option<Vec<String>>>,
    pub notes: Option<Option<String>>,
    pub flow: Option<Option<Flow>>,
    pub is_period_day: Option<bool>,
}

impl LogPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mood(mut self, mood: Option<Mood>) -> Self {
        self.mood = Some(mood);
        self
    }

    pub fn symptoms(mut self, symptoms: Option<Vec<String>>) -> Self {
        self.symptoms = Some(symptoms);
        self
    }

    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    pub fn flow(mut self, flow: Option<Flow>) -> Self {
        self.flow = Some(flow);
        self
    }

    pub fn period_day(mut self, is_period_day: bool) -> Self {
        self.is_period_day = Some(is_period_day);
        self
    }

    /// Returns true if the patch touches nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A historical cycle record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cycle {
    pub id: String,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_length: Option<u32>,
}

impl Cycle {
    /// Builds the record for a cycle that ran from `start` up to the day
    /// before `next_start`.
    pub fn completed(id: impl Into<String>, start: NaiveDate, next_start: NaiveDate) -> Self {
        let length = (next_start - start).num_days().max(0);
        Self {
            id: id.into(),
            start_date: start,
            end_date: next_start.pred_opt(),
            cycle_length: u32::try_from(length).ok(),
        }
    }

    pub fn apply(&mut self, patch: &CyclePatch) {
        if let Some(start) = patch.start_date {
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            self.end_date = end;
        }
        if let Some(length) = patch.cycle_length {
            self.cycle_length = length;
        }
    }
}

/// Partial cycle update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CyclePatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub cycle_length: Option<Option<u32>>,
}

/// A segment of the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Menstruation,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Menstruation => "menstruation",
            Self::Follicular => "follicular",
            Self::Ovulation => "ovulation",
            Self::Luteal => "luteal",
        }
    }

    /// Localized label for the status card.
    ///
    /// Menstruation is labelled per day, so it needs the cycle day.
    pub fn display_name(&self, current_day: i64) -> String {
        match self {
            Self::Menstruation => format!("День {current_day} менструации"),
            Self::Follicular => "Фолликулярная фаза".to_string(),
            Self::Ovulation => "Овуляция".to_string(),
            Self::Luteal => "Лютеиновая фаза".to_string(),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived status for one reference date. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStatus {
    /// 1-based day count since the last period start.
    pub current_day: i64,
    pub phase: Phase,
    pub phase_display_name: String,
    pub is_period_active: bool,
    /// Clamped to 0.
    pub days_until_next_period: i64,
    pub is_pregnancy_possible: bool,
}
