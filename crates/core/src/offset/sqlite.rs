//! SQLite-backed offset store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{OffsetStore, OffsetStoreError, SourceOffset};

/// SQLite-backed offset store.
pub struct SqliteOffsetStore {
    conn: Mutex<Connection>,
}

impl SqliteOffsetStore {
    /// Open or create the database at `path`.
    pub fn new(path: &Path) -> Result<Self, OffsetStoreError> {
        let conn = Connection::open(path).map_err(|e| OffsetStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory offset store (useful for testing).
    pub fn in_memory() -> Result<Self, OffsetStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| OffsetStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), OffsetStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS source_offset (
                name TEXT NOT NULL,
                rev TEXT NOT NULL,
                offset TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (name, rev)
            );
            "#,
        )
        .map_err(|e| OffsetStoreError::Database(e.to_string()))?;

        Ok(())
    }
}

impl OffsetStore for SqliteOffsetStore {
    fn load(&self, name: &str, rev: &str) -> Result<Option<SourceOffset>, OffsetStoreError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT offset FROM source_offset WHERE name = ? AND rev = ?",
            params![name, rev],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(offset) => Ok(Some(SourceOffset::new(offset))),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(OffsetStoreError::Database(e.to_string())),
        }
    }

    fn save(&self, name: &str, rev: &str, offset: &SourceOffset) -> Result<(), OffsetStoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO source_offset (name, rev, offset, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(name, rev) DO UPDATE SET offset = excluded.offset, updated_at = excluded.updated_at",
            params![name, rev, offset.offset, Utc::now().to_rfc3339()],
        )
        .map_err(|e| OffsetStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn reset(&self, name: &str, rev: &str) -> Result<(), OffsetStoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM source_offset WHERE name = ? AND rev = ?",
            params![name, rev],
        )
        .map_err(|e| OffsetStoreError::Database(e.to_string()))?;

        Ok(())
    }
}
