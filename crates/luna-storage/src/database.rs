//! High-level database interface.

use std::path::PathBuf;

use directories::ProjectDirs;
use luna_core::AppConfig;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::models::{Document, DocumentWrite, APP_CONFIG_KEY};
use crate::pool::ConnectionPool;
use crate::repository::{ConfigRepo, DocumentRepo};

/// High-level database interface for Luna.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Create a new database in the default app data directory.
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_db_path()?)
    }

    /// Create a new database at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening database at: {:?}", path);
        let pool = ConnectionPool::new(&path)?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = ConnectionPool::in_memory()?;
        Ok(Self { pool })
    }

    /// Platform directories for the app.
    pub fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "luna", "luna")
            .ok_or(StorageError::NoDataDir)
    }

    /// Get the default database path.
    pub fn default_db_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("luna.db"))
    }

    // === Config ===

    /// Get a typed configuration value with default.
    pub fn get_config_or_default<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
        default: T,
    ) -> Result<T> {
        let conn = self.pool.get()?;
        ConfigRepo::get_or_default(&conn, key, default)
    }

    /// Stored app configuration, or the defaults.
    pub fn app_config(&self) -> Result<AppConfig> {
        self.get_config_or_default(APP_CONFIG_KEY, AppConfig::default())
    }

    /// Persist the app configuration.
    pub fn set_app_config(&self, config: &AppConfig) -> Result<()> {
        let conn = self.pool.get()?;
        ConfigRepo::set(&conn, APP_CONFIG_KEY, &serde_json::to_value(config)?)?;
        info!(edit_window = config.period_edit_window_days, "Saved app config");
        Ok(())
    }

    // === Documents ===

    /// Read a document by key.
    pub fn read_document(&self, key: &str) -> Result<Option<Document>> {
        let conn = self.pool.get()?;
        DocumentRepo::get(&conn, key)
    }

    /// Write one document.
    pub fn write_document(&self, key: &str, version: i32, value: &serde_json::Value) -> Result<()> {
        let conn = self.pool.get()?;
        DocumentRepo::put(&conn, key, version, value)?;
        debug!(key, version, "Wrote document");
        Ok(())
    }

    /// Write several documents in one transaction. Either all land or none do.
    pub fn write_documents(&self, writes: &[DocumentWrite]) -> Result<()> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;

        for write in writes {
            DocumentRepo::put(&tx, write.key, write.version, &write.value)?;
        }

        tx.commit()?;
        debug!(count = writes.len(), "Wrote documents");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_app_config_round_trip() {
        let db = Database::in_memory().unwrap();
        assert_eq!(db.app_config().unwrap(), AppConfig::default());

        let config = AppConfig {
            period_edit_window_days: 120,
            ..AppConfig::default()
        };
        db.set_app_config(&config).unwrap();
        assert_eq!(db.app_config().unwrap(), config);
    }

    #[test]
    fn test_write_documents_together() {
        let db = Database::in_memory().unwrap();

        db.write_documents(&[
            DocumentWrite {
                key: "a",
                version: 1,
                value: json!({"x": 1}),
            },
            DocumentWrite {
                key: "b",
                version: 2,
                value: json!({"y": 2}),
            },
        ])
        .unwrap();

        assert_eq!(db.read_document("a").unwrap().unwrap().value["x"], 1);
        assert_eq!(db.read_document("b").unwrap().unwrap().version, 2);
    }

    #[test]
    fn test_failed_batch_leaves_nothing() {
        let db = Database::in_memory().unwrap();
        db.write_document("a", 1, &json!("before")).unwrap();

        // Reject the second write of the batch.
        {
            let conn = db.pool.get().unwrap();
            conn.execute_batch(
                "CREATE TRIGGER reject_b BEFORE INSERT ON documents
                 WHEN NEW.key = 'b'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        }

        let result = db.write_documents(&[
            DocumentWrite {
                key: "a",
                version: 1,
                value: json!("after"),
            },
            DocumentWrite {
                key: "b",
                version: 1,
                value: json!("new"),
            },
        ]);

        assert!(result.is_err());
        assert_eq!(db.read_document("a").unwrap().unwrap().value, json!("before"));
        assert!(db.read_document("b").unwrap().is_none());
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("luna.db");

        {
            let db = Database::with_path(&path).unwrap();
            db.write_document("doc", 1, &json!({"kept": true})).unwrap();
        }

        let db = Database::with_path(&path).unwrap();
        assert_eq!(db.read_document("doc").unwrap().unwrap().value["kept"], true);
    }
}
