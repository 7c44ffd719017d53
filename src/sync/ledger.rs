//! Persistent completion ledger
//!
//! A track id lands here only after its file has been fully downloaded,
//! transcoded and tagged. Backed by a single SQLite file created lazily on
//! first access; every operation opens its own short-lived connection, so no
//! lock outlives a call.

use rusqlite::Connection;
use std::path::{Path, PathBuf};

use crate::error::LedgerError;

const LEDGER_FILE: &str = "log.db";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS songs (
    id TEXT PRIMARY KEY,
    filename TEXT
);
"#;

/// Handle to the ledger database under a base directory.
#[derive(Debug, Clone)]
pub struct Ledger {
    db_path: PathBuf,
}

impl Ledger {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            db_path: base_dir.join(LEDGER_FILE),
        }
    }

    fn open(&self) -> Result<Connection, LedgerError> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    /// True iff a row for `track_id` is present.
    pub fn exists(&self, track_id: &str) -> Result<bool, LedgerError> {
        let conn = self.open()?;
        let found = conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM songs WHERE id = ?1)",
            [track_id],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    /// Insert a completion row. Fails with [`LedgerError::Duplicate`] if
    /// `track_id` is already recorded.
    pub fn record(&self, track_id: &str, filename: &str) -> Result<(), LedgerError> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO songs (id, filename) VALUES (?1, ?2)",
            [track_id, filename],
        )
        .map_err(|err| match err {
            rusqlite::Error::SqliteFailure(inner, _)
                if inner.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                LedgerError::Duplicate(track_id.to_string())
            }
            other => LedgerError::Sqlite(other),
        })?;
        Ok(())
    }

    /// Delete the row for `track_id`; no-op when absent.
    pub fn remove(&self, track_id: &str) -> Result<(), LedgerError> {
        let conn = self.open()?;
        conn.execute("DELETE FROM songs WHERE id = ?1", [track_id])?;
        Ok(())
    }
}
