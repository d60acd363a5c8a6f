//! Errors raised by the persistence layer and the stores.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A stored value or document body could not be encoded or decoded.
    #[error("invalid stored JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot prepare the data directory: {0}")]
    Io(#[from] std::io::Error),

    /// The platform has no home or data directory to place the database in.
    #[error("could not determine the app data directory")]
    NoDataDir,

    /// A previous holder of the connection panicked.
    #[error("database connection lock is poisoned")]
    Poisoned,

    /// The database was written by a newer build of the app.
    #[error("database schema version {found} is newer than supported version {supported}")]
    NewerSchema { found: i32, supported: i32 },

    /// The operation needs a profile with a last period date.
    #[error("no profile yet, complete onboarding first")]
    NoProfile,
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
