//! Daily log and cycle store.
//!
//! State lives in two tiers:
//!
//! - **Durable**: cycles, daily logs, and the waiting flag, written through to
//!   the `luna-cycle-storage` document on every change.
//! - **Session**: the recovery suppression date. Kept in memory only; it is
//!   written as null and discarded on load, so a dismissed recovery prompt can
//!   come back after a restart.
//!
//! Daily logs are keyed by date: the store never holds two logs for one day.

use chrono::NaiveDate;
use luna_core::model::{Cycle, CyclePatch, DailyLog, LogPatch};
use luna_core::recovery::RecoveryFlags;
use tracing::{debug, info, warn};

use crate::database::Database;
use crate::error::{Result, StorageError};
use crate::ids::generate_id;
use crate::listeners::{ListenerId, Listeners};
use crate::models::{CycleDocument, DocumentWrite, CYCLE_DOCUMENT_KEY, LOG_DOCUMENT_VERSION};

/// In-memory view of the log store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogState {
    /// Newest first.
    pub cycles: Vec<Cycle>,
    pub daily_logs: Vec<DailyLog>,
    pub flags: RecoveryFlags,
}

impl LogState {
    fn from_document(document: CycleDocument) -> Self {
        let flags = document.durable_flags();
        let mut state = Self {
            cycles: document.cycles,
            daily_logs: Vec::new(),
            flags,
        };
        for log in document.daily_logs {
            state.put_log(log);
        }
        sort_cycles(&mut state.cycles);
        state
    }

    fn to_document(&self) -> CycleDocument {
        CycleDocument {
            cycles: self.cycles.clone(),
            daily_logs: self.daily_logs.clone(),
            is_waiting_for_next_period: self.flags.is_waiting_for_next_period,
            recovery_suppressed_for_start_date: None,
        }
    }

    /// Log for `date`, if any.
    pub fn log_for(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.daily_logs.iter().find(|log| log.date == date)
    }

    /// Inserts `log`, replacing any log on the same date.
    pub(crate) fn put_log(&mut self, log: DailyLog) {
        match self.daily_logs.iter_mut().find(|l| l.date == log.date) {
            Some(existing) => *existing = log,
            None => self.daily_logs.push(log),
        }
    }

    /// Merges `patch` into the log for `date`, creating it if missing.
    pub(crate) fn upsert_log(&mut self, date: NaiveDate, patch: &LogPatch) -> DailyLog {
        let log = match self.log_for(date) {
            Some(existing) => existing.clone().apply(patch),
            None => DailyLog::new(generate_id(), date).apply(patch),
        };
        self.put_log(log.clone());
        log
    }
}

/// Keeps cycles in descending start order.
pub(crate) fn sort_cycles(cycles: &mut [Cycle]) {
    cycles.sort_by(|a, b| b.start_date.cmp(&a.start_date));
}

/// Mutable collection of daily logs and cycles.
pub struct LogStore {
    db: Database,
    state: LogState,
    listeners: Listeners<LogState>,
}

impl LogStore {
    /// Loads the cycle document, migrating older versions.
    ///
    /// The session tier always starts empty. An unreadable document loads as
    /// empty.
    pub fn load(db: Database) -> Result<Self> {
        let state = match db.read_document(CYCLE_DOCUMENT_KEY) {
            Ok(Some(doc)) => {
                let stored_version = doc.version;
                match serde_json::from_value::<CycleDocument>(doc.value) {
                    Ok(document) => {
                        let state = LogState::from_document(document);
                        if stored_version < LOG_DOCUMENT_VERSION {
                            info!(
                                "Migrating cycle document from version {} to {}",
                                stored_version, LOG_DOCUMENT_VERSION
                            );
                            let write = Self::document_write(&state)?;
                            db.write_document(write.key, write.version, &write.value)?;
                        } else if stored_version > LOG_DOCUMENT_VERSION {
                            warn!(
                                "Cycle document version {} is newer than {}, reading known fields",
                                stored_version, LOG_DOCUMENT_VERSION
                            );
                        }
                        state
                    }
                    Err(e) => {
                        warn!(error = %e, "Cycle document is unreadable, starting empty");
                        LogState::default()
                    }
                }
            }
            Ok(None) => LogState::default(),
            Err(StorageError::Json(e)) => {
                warn!(error = %e, "Cycle document is not valid JSON, starting empty");
                LogState::default()
            }
            Err(e) => return Err(e),
        };

        debug!(
            logs = state.daily_logs.len(),
            cycles = state.cycles.len(),
            waiting = state.flags.is_waiting_for_next_period,
            "Loaded log store"
        );

        Ok(Self {
            db,
            state,
            listeners: Listeners::default(),
        })
    }

    pub fn state(&self) -> &LogState {
        &self.state
    }

    pub fn logs(&self) -> &[DailyLog] {
        &self.state.daily_logs
    }

    /// Cycles, newest first.
    pub fn cycles(&self) -> &[Cycle] {
        &self.state.cycles
    }

    pub fn flags(&self) -> &RecoveryFlags {
        &self.state.flags
    }

    pub fn get_daily_log(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.state.log_for(date)
    }

    /// Adds a log. A log already on that date is replaced.
    pub fn add_daily_log(&mut self, log: DailyLog) -> Result<()> {
        let mut next = self.state.clone();
        debug!(date = %log.date, "Adding daily log");
        next.put_log(log);
        self.replace(next)
    }

    /// Merges `patch` into the log for `date`, creating it with
    /// `is_period_day = false` when missing.
    pub fn upsert_daily_log(&mut self, date: NaiveDate, patch: &LogPatch) -> Result<DailyLog> {
        let mut next = self.state.clone();
        let log = next.upsert_log(date, patch);
        debug!(date = %date, "Upserted daily log");
        self.replace(next)?;
        Ok(log)
    }

    /// Removes the log for `date`. Returns false if there was none.
    pub fn delete_daily_log(&mut self, date: NaiveDate) -> Result<bool> {
        if self.state.log_for(date).is_none() {
            return Ok(false);
        }
        let mut next = self.state.clone();
        next.daily_logs.retain(|log| log.date != date);
        debug!(date = %date, "Deleted daily log");
        self.replace(next)?;
        Ok(true)
    }

    /// Adds a cycle, keeping newest-first order.
    pub fn add_cycle(&mut self, cycle: Cycle) -> Result<()> {
        let mut next = self.state.clone();
        debug!(start = %cycle.start_date, "Adding cycle");
        next.cycles.push(cycle);
        sort_cycles(&mut next.cycles);
        self.replace(next)
    }

    /// Patches the cycle with `id`. Returns false if there is none.
    pub fn update_cycle(&mut self, id: &str, patch: &CyclePatch) -> Result<bool> {
        let mut next = self.state.clone();
        let Some(cycle) = next.cycles.iter_mut().find(|c| c.id == id) else {
            return Ok(false);
        };
        cycle.apply(patch);
        sort_cycles(&mut next.cycles);
        self.replace(next)?;
        Ok(true)
    }

    /// Sets the durable waiting flag.
    pub fn set_waiting_for_next_period(&mut self, waiting: bool) -> Result<()> {
        let mut next = self.state.clone();
        next.flags.is_waiting_for_next_period = waiting;
        self.replace(next)
    }

    /// Sets the session-only suppression date. Nothing is written.
    pub fn set_recovery_suppressed_for(&mut self, date: Option<NaiveDate>) {
        let mut next = self.state.clone();
        next.flags.recovery_suppressed_for_start_date = date;
        self.commit(next);
    }

    /// Drops every log, cycle, and flag.
    pub fn clear(&mut self) -> Result<()> {
        self.replace(LogState::default())?;
        info!("Log store cleared");
        Ok(())
    }

    pub fn subscribe<F>(&mut self, callback: F) -> ListenerId
    where
        F: Fn(&LogState) + Send + Sync + 'static,
    {
        self.listeners.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Serialized durable tier of `state`.
    pub(crate) fn document_write(state: &LogState) -> Result<DocumentWrite> {
        Ok(DocumentWrite {
            key: CYCLE_DOCUMENT_KEY,
            version: LOG_DOCUMENT_VERSION,
            value: serde_json::to_value(state.to_document())?,
        })
    }

    /// Installs an already persisted state and notifies.
    pub(crate) fn commit(&mut self, state: LogState) {
        self.state = state;
        self.listeners.notify(&self.state);
    }

    fn replace(&mut self, next: LogState) -> Result<()> {
        let write = Self::document_write(&next)?;
        self.db.write_document(write.key, write.version, &write.value)?;
        self.commit(next);
        Ok(())
    }
}
