//! Application configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::CalendarRange;

/// Tunable bounds for the calendar and input validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// First date the calendar renders.
    #[serde(default = "default_calendar_start")]
    pub calendar_start: NaiveDate,
    /// Last date the calendar renders.
    #[serde(default = "default_calendar_end")]
    pub calendar_end: NaiveDate,
    /// How far back a period range edit may reach.
    #[serde(default = "default_period_edit_window_days")]
    pub period_edit_window_days: i64,
    /// Oldest last-period date accepted at onboarding.
    #[serde(default = "default_onboarding_max_age_months")]
    pub onboarding_max_age_months: u32,
    /// Oldest last-period date accepted from settings.
    #[serde(default = "default_settings_max_age_months")]
    pub settings_max_age_months: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            calendar_start: default_calendar_start(),
            calendar_end: default_calendar_end(),
            period_edit_window_days: default_period_edit_window_days(),
            onboarding_max_age_months: default_onboarding_max_age_months(),
            settings_max_age_months: default_settings_max_age_months(),
        }
    }
}

impl AppConfig {
    /// Calendar bounds as a range.
    pub fn calendar_range(&self) -> CalendarRange {
        CalendarRange::new(self.calendar_start, self.calendar_end)
    }
}

fn default_calendar_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 1).unwrap_or_default()
}

fn default_calendar_end() -> NaiveDate {
    NaiveDate::from_ymd_opt(2027, 12, 31).unwrap_or_default()
}

fn default_period_edit_window_days() -> i64 {
    90
}

fn default_onboarding_max_age_months() -> u32 {
    3
}

fn default_settings_max_age_months() -> u32 {
    6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_multi_year_window() {
        let config = AppConfig::default();
        assert_eq!(config.calendar_start.to_string(), "2025-10-01");
        assert_eq!(config.calendar_end.to_string(), "2027-12-31");
        assert_eq!(config.period_edit_window_days, 90);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"period_edit_window_days": 60}"#).unwrap();
        assert_eq!(config.period_edit_window_days, 60);
        assert_eq!(config.calendar_start, AppConfig::default().calendar_start);
        assert_eq!(config.onboarding_max_age_months, 3);
    }
}
