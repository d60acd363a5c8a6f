//! Versioned JSON document repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::Document;

/// Repository for document operations.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Get a document by key.
    pub fn get(conn: &Connection, key: &str) -> Result<Option<Document>> {
        let row: Option<(String, String, i32, String)> = conn
            .query_row(
                "SELECT key, value, version, updated_at FROM documents WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((key, value_str, version, updated_at)) = row else {
            return Ok(None);
        };

        Ok(Some(Document {
            key,
            value: serde_json::from_str(&value_str)?,
            version,
            updated_at: parse_timestamp(&updated_at),
        }))
    }

    /// Write a document (insert or replace).
    pub fn put(conn: &Connection, key: &str, version: i32, value: &serde_json::Value) -> Result<()> {
        let value_json = serde_json::to_string(value)?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO documents (key, value, version, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET value = ?2, version = ?3, updated_at = ?4",
            params![key, value_json, version, now],
        )?;

        Ok(())
    }
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::schema::run_migrations;
    use serde_json::json;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_put_and_get() {
        let conn = setup_db();

        DocumentRepo::put(&conn, "doc", 2, &json!({"dailyLogs": []})).unwrap();
        let doc = DocumentRepo::get(&conn, "doc").unwrap().unwrap();

        assert_eq!(doc.key, "doc");
        assert_eq!(doc.version, 2);
        assert_eq!(doc.value["dailyLogs"], json!([]));
    }

    #[test]
    fn test_put_overwrites_value_and_version() {
        let conn = setup_db();

        DocumentRepo::put(&conn, "doc", 1, &json!({"a": 1})).unwrap();
        DocumentRepo::put(&conn, "doc", 2, &json!({"a": 2})).unwrap();

        let doc = DocumentRepo::get(&conn, "doc").unwrap().unwrap();
        assert_eq!(doc.version, 2);
        assert_eq!(doc.value["a"], 2);
    }

    #[test]
    fn test_get_missing() {
        let conn = setup_db();
        assert!(DocumentRepo::get(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_document_is_json_error() {
        let conn = setup_db();
        conn.execute(
            "INSERT INTO documents (key, value, version) VALUES ('doc', '{oops', 1)",
            [],
        )
        .unwrap();

        assert!(matches!(
            DocumentRepo::get(&conn, "doc"),
            Err(StorageError::Json(_))
        ));
    }
}
