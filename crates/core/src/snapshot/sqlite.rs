use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use super::store::SnapshotStore;
use super::types::SnapshotError;

/// SQLite-backed snapshot payload store.
pub struct SqliteSnapshotStore {
    conn: Mutex<Connection>,
}

impl SqliteSnapshotStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let conn =
            Connection::open(path).map_err(|e| SnapshotError::Database(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self, SnapshotError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SnapshotError::Database(e.to_string()))?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), SnapshotError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS snapshot (
                name TEXT NOT NULL,
                rev TEXT NOT NULL,
                payload BLOB NOT NULL,
                captured_at TEXT NOT NULL,
                PRIMARY KEY (name, rev)
            );
            "#,
        )
        .map_err(|e| SnapshotError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SnapshotError> {
        self.conn
            .lock()
            .map_err(|e| SnapshotError::Database(e.to_string()))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn put(&self, name: &str, rev: &str, payload: &[u8]) -> Result<(), SnapshotError> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO snapshot (name, rev, payload, captured_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (name, rev) DO UPDATE SET
                payload = excluded.payload,
                captured_at = excluded.captured_at
            "#,
            params![name, rev, payload, Utc::now().to_rfc3339()],
        )
        .map_err(|e| SnapshotError::Database(e.to_string()))?;
        Ok(())
    }

    fn get(&self, name: &str, rev: &str) -> Result<Option<Vec<u8>>, SnapshotError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT payload FROM snapshot WHERE name = ?1 AND rev = ?2",
            params![name, rev],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| SnapshotError::Database(e.to_string()))
    }

    fn exists(&self, name: &str, rev: &str) -> Result<bool, SnapshotError> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM snapshot WHERE name = ?1 AND rev = ?2",
                params![name, rev],
                |row| row.get(0),
            )
            .map_err(|e| SnapshotError::Database(e.to_string()))?;
        Ok(count > 0)
    }

    fn delete(&self, name: &str, rev: &str) -> Result<(), SnapshotError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM snapshot WHERE name = ?1 AND rev = ?2",
            params![name, rev],
        )
        .map_err(|e| SnapshotError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_missing_is_none() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        assert!(store.get("logs", "0").unwrap().is_none());
        assert!(!store.exists("logs", "0").unwrap());
    }

    #[test]
    fn test_put_then_get() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        store.put("logs", "0", b"[{\"id\":\"r1\"}]").unwrap();

        assert!(store.exists("logs", "0").unwrap());
        assert_eq!(
            store.get("logs", "0").unwrap().unwrap(),
            b"[{\"id\":\"r1\"}]"
        );
    }

    #[test]
    fn test_put_overwrites_previous_payload() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        store.put("logs", "0", b"old").unwrap();
        store.put("logs", "0", b"new").unwrap();

        assert_eq!(store.get("logs", "0").unwrap().unwrap(), b"new");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        store.put("logs", "0", b"payload").unwrap();

        store.delete("logs", "0").unwrap();
        assert!(!store.exists("logs", "0").unwrap());
        store.delete("logs", "0").unwrap();
    }

    #[test]
    fn test_revisions_are_isolated() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        store.put("logs", "0", b"rev0").unwrap();
        store.put("logs", "1", b"rev1").unwrap();

        assert_eq!(store.get("logs", "0").unwrap().unwrap(), b"rev0");
        assert_eq!(store.get("logs", "1").unwrap().unwrap(), b"rev1");
    }
}
