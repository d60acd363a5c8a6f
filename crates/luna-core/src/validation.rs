//! Onboarding and settings input validation.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{OnboardingData, ProfilePatch};

/// Longest accepted display name, in characters.
pub const MAX_NAME_LENGTH: usize = 50;

/// Shortest accepted average cycle length.
pub const MIN_CYCLE_LENGTH: u32 = 21;

/// Longest accepted average cycle length.
pub const MAX_CYCLE_LENGTH: u32 = 45;

/// Input rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is too long (maximum {MAX_NAME_LENGTH} characters)")]
    NameTooLong,

    #[error("cycle length must be between {MIN_CYCLE_LENGTH} and {MAX_CYCLE_LENGTH} days")]
    CycleLengthOutOfRange(u32),

    #[error("the date cannot be in the future")]
    DateInFuture,

    #[error("the date is too old, pick one within the last {0} months")]
    DateTooOld(u32),
}

/// Result type for validation.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Values edited on the settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsInput {
    pub name: String,
    pub last_period_date: NaiveDate,
    pub average_cycle_length: u32,
}

impl SettingsInput {
    /// Profile patch carrying every settings field.
    pub fn to_patch(&self) -> ProfilePatch {
        ProfilePatch {
            name: Some(self.name.clone()),
            last_period_date: Some(self.last_period_date),
            average_cycle_length: Some(self.average_cycle_length),
            onboarding_completed: None,
        }
    }
}

/// Validates onboarding input against `today`.
pub fn validate_onboarding(data: &OnboardingData, today: NaiveDate, max_age_months: u32) -> Result<()> {
    validate_name(&data.name)?;
    validate_last_period(data.last_period_date, today, max_age_months)?;
    validate_cycle_length(data.average_cycle_length)
}

/// Validates settings input against `today`.
pub fn validate_settings(input: &SettingsInput, today: NaiveDate, max_age_months: u32) -> Result<()> {
    validate_name(&input.name)?;
    validate_cycle_length(input.average_cycle_length)?;
    validate_last_period(input.last_period_date, today, max_age_months)
}

pub fn validate_name(name: &str) -> Result<()> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::NameTooLong);
    }
    Ok(())
}

pub fn validate_cycle_length(length: u32) -> Result<()> {
    if !(MIN_CYCLE_LENGTH..=MAX_CYCLE_LENGTH).contains(&length) {
        return Err(ValidationError::CycleLengthOutOfRange(length));
    }
    Ok(())
}

/// Checks a last-period date lies within `max_age_months` before `today`.
pub fn validate_last_period(date: NaiveDate, today: NaiveDate, max_age_months: u32) -> Result<()> {
    if date > today {
        return Err(ValidationError::DateInFuture);
    }

    let oldest = today
        .checked_sub_months(Months::new(max_age_months))
        .unwrap_or(NaiveDate::MIN);
    if date < oldest {
        return Err(ValidationError::DateTooOld(max_age_months));
    }
    Ok(())
}
