//! Cycle tracker composition service.
//!
//! Owns both stores and exposes the user-level operations. Operations that
//! touch both stores write the two documents in one transaction and only then
//! update memory, so callers never observe a half-applied change.

use chrono::NaiveDate;
use luna_core::calendar::{build_markings, MarkedDates, Selection};
use luna_core::model::{Cycle, CycleStatus, LogPatch, OnboardingData, UserProfile};
use luna_core::period_edit::{apply_period_range, EditError, PeriodEditor, PeriodRange};
use luna_core::phase::{compute_status, days_between, days_until_phase_end, PERIOD_LENGTH};
use luna_core::recovery::{clamp_recovery_date, home_view, HomeView, RecoveryAction};
use luna_core::stats::{cycle_stats, CycleStats};
use luna_core::validation::{validate_onboarding, validate_settings, SettingsInput, ValidationError};
use luna_core::AppConfig;
use tracing::{debug, info};

use crate::database::Database;
use crate::error::StorageError;
use crate::ids::generate_id;
use crate::log_store::{sort_cycles, LogState, LogStore};
use crate::profile_store::ProfileStore;

/// Error type for tracker operations.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("invalid period range: {0}")]
    Edit(#[from] EditError),

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for tracker operations.
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Profile and log stores composed into the app's operations.
pub struct CycleTracker {
    db: Database,
    config: AppConfig,
    profile: ProfileStore,
    logs: LogStore,
}

impl CycleTracker {
    /// Loads both stores, reading the app config from the database.
    pub fn open(db: Database) -> Result<Self> {
        let config = db.app_config()?;
        Self::with_config(db, config)
    }

    /// Loads both stores with an explicit config.
    pub fn with_config(db: Database, config: AppConfig) -> Result<Self> {
        let profile = ProfileStore::load(db.clone())?;
        let logs = LogStore::load(db.clone())?;
        info!(onboarded = profile.is_onboarded(), "Cycle tracker ready");

        Ok(Self {
            db,
            config,
            profile,
            logs,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Persists `config` and uses it from now on.
    pub fn save_config(&mut self, config: AppConfig) -> Result<()> {
        self.db.set_app_config(&config)?;
        self.config = config;
        Ok(())
    }

    pub fn profile(&self) -> &ProfileStore {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut ProfileStore {
        &mut self.profile
    }

    pub fn logs(&self) -> &LogStore {
        &self.logs
    }

    pub fn logs_mut(&mut self) -> &mut LogStore {
        &mut self.logs
    }

    // ==================== Onboarding ====================

    /// Validates onboarding input and creates the profile.
    pub fn complete_onboarding(&mut self, data: &OnboardingData, today: NaiveDate) -> Result<UserProfile> {
        validate_onboarding(data, today, self.config.onboarding_max_age_months)?;
        Ok(self.profile.complete_onboarding(data)?)
    }

    // ==================== Status ====================

    /// What the home screen shows on `today`.
    pub fn home_view(&self, today: NaiveDate) -> HomeView {
        home_view(self.profile.get(), self.logs.logs(), self.logs.flags(), today)
    }

    pub fn status(&self, today: NaiveDate) -> Option<CycleStatus> {
        compute_status(self.profile.get()?, today)
    }

    /// Days left in the current phase, on the cycle-length-relative model.
    pub fn days_until_phase_end(&self, today: NaiveDate) -> Option<i64> {
        let profile = self.profile.get()?;
        days_until_phase_end(&compute_status(profile, today)?, profile)
    }

    // ==================== Recovery ====================

    /// Applies the user's answer to the recovery prompt.
    pub fn apply_recovery(&mut self, action: RecoveryAction, today: NaiveDate) -> Result<()> {
        match action {
            RecoveryAction::PeriodStarted(date) => self.confirm_period_started(date, today).map(|_| ()),
            RecoveryAction::NoPeriodYet => self.report_no_period(),
        }
    }

    /// A period started on `date`. Returns the clamped date used.
    ///
    /// Moves the anchor, flags the day as a period day, and clears both
    /// recovery flags.
    pub fn confirm_period_started(&mut self, date: NaiveDate, today: NaiveDate) -> Result<NaiveDate> {
        let (mut user, previous) = self.anchored_profile()?;
        let date = clamp_recovery_date(date, previous, today);

        let mut logs = self.logs.state().clone();
        logs.upsert_log(date, &LogPatch::new().period_day(true));
        logs.flags.is_waiting_for_next_period = false;
        logs.flags.recovery_suppressed_for_start_date = None;
        record_completed_cycle(&mut logs, previous, date);

        user.last_period_date = Some(date);
        self.commit_both(user, logs)?;

        info!(previous = %previous, start = %date, "Period start confirmed");
        Ok(date)
    }

    /// No period yet: enter waiting and suppress the prompt for this anchor.
    pub fn report_no_period(&mut self) -> Result<()> {
        let (_, anchor) = self.anchored_profile()?;

        self.logs.set_waiting_for_next_period(true)?;
        self.logs.set_recovery_suppressed_for(Some(anchor));

        info!(anchor = %anchor, "Waiting for next period");
        Ok(())
    }

    // ==================== Period Edit ====================

    /// Saves the editor's range.
    ///
    /// Rejected ranges leave everything untouched and the editor still
    /// editing. On success the editor returns to idle.
    pub fn save_period_edit(&mut self, editor: &mut PeriodEditor, today: NaiveDate) -> Result<PeriodRange> {
        let window = self.config.period_edit_window_days;
        let range = editor.validate(today, window)?;
        let (mut user, previous) = self.anchored_profile()?;

        let mut logs = self.logs.state().clone();
        logs.daily_logs = apply_period_range(&logs.daily_logs, &range, today, window, |_| generate_id());
        if range.start != previous {
            logs.flags.is_waiting_for_next_period = false;
        }
        record_completed_cycle(&mut logs, previous, range.start);

        user.last_period_date = Some(range.start);
        self.commit_both(user, logs)?;
        editor.cancel();

        info!(start = %range.start, end = %range.end, "Period range saved");
        Ok(range)
    }

    // ==================== Settings ====================

    /// Validates and applies the settings form.
    ///
    /// Moving the last period date clears the waiting state.
    pub fn update_settings(&mut self, input: &SettingsInput, today: NaiveDate) -> Result<()> {
        validate_settings(input, today, self.config.settings_max_age_months)?;
        let mut user = self.profile.get().cloned().ok_or(StorageError::NoProfile)?;

        let anchor_changed = user.last_period_date != Some(input.last_period_date);
        user.apply(&input.to_patch());

        let mut logs = self.logs.state().clone();
        if anchor_changed {
            logs.flags.is_waiting_for_next_period = false;
        }

        self.commit_both(user, logs)?;
        info!(anchor_changed, "Settings updated");
        Ok(())
    }

    // ==================== Calendar & Stats ====================

    /// Calendar markings with `selection` highlighted.
    pub fn calendar(&self, selection: &Selection) -> MarkedDates {
        build_markings(
            self.profile.get(),
            self.logs.logs(),
            selection,
            &self.config.calendar_range(),
        )
    }

    /// Date the calendar opens on.
    pub fn initial_calendar_date(&self, today: NaiveDate) -> NaiveDate {
        self.config.calendar_range().clamp(today)
    }

    pub fn cycle_stats(&self) -> CycleStats {
        let anchor = self.profile.get().and_then(|p| p.last_period_date);
        cycle_stats(self.logs.cycles(), anchor, self.logs.logs())
    }

    // ==================== Reset ====================

    /// Clears profile, cycles, logs, and flags in one step.
    pub fn reset_all(&mut self) -> Result<()> {
        let writes = [
            ProfileStore::document_write(&None)?,
            LogStore::document_write(&LogState::default())?,
        ];
        self.db.write_documents(&writes)?;

        self.profile.commit(None);
        self.logs.commit(LogState::default());
        info!("All data reset");
        Ok(())
    }

    fn anchored_profile(&self) -> Result<(UserProfile, NaiveDate)> {
        let user = self.profile.get().cloned().ok_or(StorageError::NoProfile)?;
        let anchor = user.last_period_date.ok_or(StorageError::NoProfile)?;
        Ok((user, anchor))
    }

    fn commit_both(&mut self, user: UserProfile, logs: LogState) -> Result<()> {
        let user = Some(user);
        let writes = [
            ProfileStore::document_write(&user)?,
            LogStore::document_write(&logs)?,
        ];
        self.db.write_documents(&writes)?;

        self.profile.commit(user);
        self.logs.commit(logs);
        Ok(())
    }
}

/// Records the cycle that ended when a period started on `new_start`.
///
/// A start inside the previous period's window is a correction of that
/// period, not a new cycle. Each start is recorded once.
fn record_completed_cycle(logs: &mut LogState, previous: NaiveDate, new_start: NaiveDate) -> bool {
    if days_between(previous, new_start) < PERIOD_LENGTH
        || logs.cycles.iter().any(|c| c.start_date == previous)
    {
        return false;
    }

    let cycle = Cycle::completed(generate_id(), previous, new_start);
    debug!(start = %previous, length = ?cycle.cycle_length, "Recorded completed cycle");
    logs.cycles.push(cycle);
    sort_cycles(&mut logs.cycles);
    true
}
