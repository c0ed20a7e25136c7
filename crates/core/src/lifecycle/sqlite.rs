//! SQLite-backed state store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{PipelineState, StateStore, StateStoreError};

/// SQLite-backed state store.
///
/// Persists the current state per (name, rev) plus an append-only history
/// bounded at `history_limit` entries (oldest evicted on overflow).
pub struct SqliteStateStore {
    conn: Mutex<Connection>,
    history_limit: usize,
}

impl SqliteStateStore {
    /// Open or create the database at `path`.
    pub fn new(path: &Path, history_limit: usize) -> Result<Self, StateStoreError> {
        let conn = Connection::open(path).map_err(|e| StateStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            history_limit,
        })
    }

    /// Create an in-memory state store (useful for testing).
    pub fn in_memory(history_limit: usize) -> Result<Self, StateStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| StateStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            history_limit,
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), StateStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS pipeline_state (
                name TEXT NOT NULL,
                rev TEXT NOT NULL,
                state TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (name, rev)
            );

            CREATE TABLE IF NOT EXISTS pipeline_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                rev TEXT NOT NULL,
                state TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_history_pipeline ON pipeline_history(name, rev);
            "#,
        )
        .map_err(|e| StateStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_state(row: &rusqlite::Row) -> rusqlite::Result<PipelineState> {
        let state_json: String = row.get(0)?;
        let state: PipelineState = serde_json::from_str(&state_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(state)
    }
}

impl StateStore for SqliteStateStore {
    fn current(&self, name: &str, rev: &str) -> Result<Option<PipelineState>, StateStoreError> {
        let conn = self.conn.lock().unwrap();

        let result = conn.query_row(
            "SELECT state FROM pipeline_state WHERE name = ? AND rev = ?",
            params![name, rev],
            Self::row_to_state,
        );

        match result {
            Ok(state) => Ok(Some(state)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StateStoreError::Database(e.to_string())),
        }
    }

    fn save(&self, state: &PipelineState) -> Result<(), StateStoreError> {
        let mut conn = self.conn.lock().unwrap();

        let state_json =
            serde_json::to_string(state).map_err(|e| StateStoreError::Database(e.to_string()))?;
        let now: DateTime<Utc> = Utc::now();

        let tx = conn
            .transaction()
            .map_err(|e| StateStoreError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO pipeline_state (name, rev, state, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(name, rev) DO UPDATE SET state = excluded.state, updated_at = excluded.updated_at",
            params![state.name, state.rev, state_json, now.to_rfc3339()],
        )
        .map_err(|e| StateStoreError::Database(e.to_string()))?;

        tx.execute(
            "INSERT INTO pipeline_history (name, rev, state, created_at) VALUES (?, ?, ?, ?)",
            params![state.name, state.rev, state_json, now.to_rfc3339()],
        )
        .map_err(|e| StateStoreError::Database(e.to_string()))?;

        // Evict oldest entries beyond the bound.
        tx.execute(
            "DELETE FROM pipeline_history WHERE id IN (
                 SELECT id FROM pipeline_history WHERE name = ? AND rev = ?
                 ORDER BY id DESC LIMIT -1 OFFSET ?
             )",
            params![state.name, state.rev, self.history_limit as i64],
        )
        .map_err(|e| StateStoreError::Database(e.to_string()))?;

        tx.commit()
            .map_err(|e| StateStoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn history(&self, name: &str, rev: &str) -> Result<Vec<PipelineState>, StateStoreError> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn
            .prepare(
                "SELECT state FROM pipeline_history WHERE name = ? AND rev = ? ORDER BY id ASC",
            )
            .map_err(|e| StateStoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![name, rev], Self::row_to_state)
            .map_err(|e| StateStoreError::Database(e.to_string()))?;

        let mut states = Vec::new();
        for row_result in rows {
            let state = row_result.map_err(|e| StateStoreError::Database(e.to_string()))?;
            states.push(state);
        }

        Ok(states)
    }

    fn clear_history(&self, name: &str, rev: &str) -> Result<(), StateStoreError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "DELETE FROM pipeline_history WHERE name = ? AND rev = ?",
            params![name, rev],
        )
        .map_err(|e| StateStoreError::Database(e.to_string()))?;

        Ok(())
    }
}
