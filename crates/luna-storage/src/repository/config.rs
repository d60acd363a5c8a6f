//! Configuration repository.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::error::Result;
use crate::models::Config;

/// Repository for configuration operations.
pub struct ConfigRepo;

impl ConfigRepo {
    /// Get a configuration value.
    pub fn get(conn: &Connection, key: &str) -> Result<Option<Config>> {
        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT key, value FROM config WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(row.map(|(key, value_str)| {
            let value = serde_json::from_str(&value_str).unwrap_or_else(|e| {
                warn!(key = %key, error = %e, "Unreadable config value");
                serde_json::Value::Null
            });
            Config { key, value }
        }))
    }

    /// Set a configuration value (insert or update).
    pub fn set(conn: &Connection, key: &str, value: &serde_json::Value) -> Result<()> {
        let value_json = serde_json::to_string(value)?;

        conn.execute(
            "INSERT INTO config (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value_json],
        )?;

        Ok(())
    }

    /// Get a typed configuration value, falling back to `default` when the
    /// key is missing or unreadable.
    pub fn get_or_default<T: serde::de::DeserializeOwned>(
        conn: &Connection,
        key: &str,
        default: T,
    ) -> Result<T> {
        match Self::get(conn, key)? {
            Some(config) => match serde_json::from_value(config.value) {
                Ok(value) => Ok(value),
                Err(e) => {
                    warn!(key = %key, error = %e, "Config value has wrong shape, using default");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::run_migrations;
    use luna_core::AppConfig;
    use serde_json::json;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_set_and_get() {
        let conn = setup_db();

        ConfigRepo::set(&conn, "log_level", &json!("debug")).unwrap();
        let config = ConfigRepo::get(&conn, "log_level").unwrap().unwrap();

        assert_eq!(config.key, "log_level");
        assert_eq!(config.value, json!("debug"));
    }

    #[test]
    fn test_update_existing() {
        let conn = setup_db();

        ConfigRepo::set(&conn, "key", &json!("original")).unwrap();
        ConfigRepo::set(&conn, "key", &json!("updated")).unwrap();

        let config = ConfigRepo::get(&conn, "key").unwrap().unwrap();
        assert_eq!(config.value, json!("updated"));
    }

    #[test]
    fn test_get_nonexistent() {
        let conn = setup_db();
        assert!(ConfigRepo::get(&conn, "nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_get_or_default_app_config() {
        let conn = setup_db();

        let config: AppConfig =
            ConfigRepo::get_or_default(&conn, "app_config", AppConfig::default()).unwrap();
        assert_eq!(config, AppConfig::default());

        ConfigRepo::set(&conn, "app_config", &json!({"period_edit_window_days": 60})).unwrap();
        let config: AppConfig =
            ConfigRepo::get_or_default(&conn, "app_config", AppConfig::default()).unwrap();
        assert_eq!(config.period_edit_window_days, 60);
        assert_eq!(config.settings_max_age_months, 6);
    }

    #[test]
    fn test_corrupt_value_falls_back() {
        let conn = setup_db();
        conn.execute(
            "INSERT INTO config (key, value) VALUES ('app_config', '{not json')",
            [],
        )
        .unwrap();

        let config: AppConfig =
            ConfigRepo::get_or_default(&conn, "app_config", AppConfig::default()).unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
