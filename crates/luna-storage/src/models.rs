//! Data models for storage.

use chrono::{DateTime, NaiveDate, Utc};
use luna_core::model::{Cycle, DailyLog, UserProfile};
use luna_core::recovery::RecoveryFlags;
use serde::{Deserialize, Serialize};

/// Document key for the profile.
pub const USER_DOCUMENT_KEY: &str = "luna-user-storage";

/// Document key for cycles, logs, and recovery flags.
pub const CYCLE_DOCUMENT_KEY: &str = "luna-cycle-storage";

/// Current profile document version.
pub const USER_DOCUMENT_VERSION: i32 = 1;

/// Current cycle document version.
///
/// Version 1 held only cycles and logs; version 2 added the recovery flags.
pub const LOG_DOCUMENT_VERSION: i32 = 2;

/// Config key holding the serialized `AppConfig`.
pub const APP_CONFIG_KEY: &str = "app_config";

/// A configuration key-value pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration key.
    pub key: String,
    /// Configuration value (JSON).
    pub value: serde_json::Value,
}

/// A stored JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub key: String,
    pub value: serde_json::Value,
    pub version: i32,
    pub updated_at: DateTime<Utc>,
}

/// A document queued for writing.
#[derive(Debug, Clone)]
pub struct DocumentWrite {
    pub key: &'static str,
    pub version: i32,
    pub value: serde_json::Value,
}

/// Persisted shape of the profile store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    #[serde(default)]
    pub user: Option<UserProfile>,
}

/// Persisted shape of the log store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleDocument {
    #[serde(default)]
    pub cycles: Vec<Cycle>,
    #[serde(default)]
    pub daily_logs: Vec<DailyLog>,
    #[serde(default)]
    pub is_waiting_for_next_period: bool,
    /// Always written as null; the value lives in the session tier only.
    #[serde(default)]
    pub recovery_suppressed_for_start_date: Option<NaiveDate>,
}

impl CycleDocument {
    /// Durable flags, with the session-only suppression dropped.
    pub fn durable_flags(&self) -> RecoveryFlags {
        RecoveryFlags {
            is_waiting_for_next_period: self.is_waiting_for_next_period,
            recovery_suppressed_for_start_date: None,
        }
    }
}
