//! Luna Storage - SQLite persistence layer and stores.
//!
//! This crate persists the app's two documents and composes the stores:
//!
//! - Profile document (`luna-user-storage`) behind [`ProfileStore`]
//! - Cycle and log document (`luna-cycle-storage`) behind [`LogStore`]
//! - Configuration key-value storage, including the [`AppConfig`](luna_core::AppConfig)
//! - [`CycleTracker`], the operations the UI calls
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use luna_core::model::OnboardingData;
//! use luna_storage::{CycleTracker, Database};
//!
//! let db = Database::in_memory().unwrap();
//! let mut tracker = CycleTracker::open(db).unwrap();
//!
//! let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
//! tracker.complete_onboarding(&OnboardingData {
//!     name: "Maria".to_string(),
//!     last_period_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
//!     average_cycle_length: 28,
//! }, today).unwrap();
//!
//! println!("{:?}", tracker.home_view(today));
//! ```

mod database;
pub mod error;
mod ids;
pub mod listeners;
pub mod log_store;
pub mod models;
mod pool;
pub mod profile_store;
pub mod repository;
mod schema;
pub mod tracker;

pub use database::Database;
pub use error::{Result, StorageError};
pub use listeners::ListenerId;
pub use log_store::{LogState, LogStore};
pub use models::{
    Config, CycleDocument, Document, DocumentWrite, UserDocument, CYCLE_DOCUMENT_KEY,
    LOG_DOCUMENT_VERSION, USER_DOCUMENT_KEY,
};
pub use pool::ConnectionPool;
pub use profile_store::ProfileStore;
pub use tracker::{CycleTracker, TrackerError};
