//! SQLite store connection wrapper.
//!
//! [`Store`] owns a rusqlite [`Connection`] to the single database file and
//! provides helpers for opening it and transacting against it.

use crate::error::{DbError, DbResult};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Wrapper around the connection to the embedded store.
///
/// Single-threaded. One process migrates one table at a time, and writers
/// are serialized by SQLite at the file level.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database file at `path`.
    ///
    /// `busy_timeout` bounds how long a statement waits on another
    /// connection's write lock before failing with `SQLITE_BUSY`.
    pub fn open(path: &Path, busy_timeout: Duration) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        conn.busy_timeout(busy_timeout)
            .map_err(|e| DbError::ConnectionError(format!("busy_timeout: {e}")))?;
        log::debug!("Opened store at {}", path.display());
        Ok(Self { conn })
    }

    /// Create an in-memory store.
    ///
    /// Useful for unit tests that don't need persistence.
    pub fn open_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Borrow the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Execute `body` within a `BEGIN IMMEDIATE` / `COMMIT` transaction,
    /// rolling back on error.
    ///
    /// `IMMEDIATE` takes the file's write lock up front, so no other writer
    /// can interleave with the body and readers on other connections see
    /// either the state before `BEGIN` or the state after `COMMIT`.
    pub fn transaction<F, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(&Connection) -> Result<T, E>,
        E: From<DbError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(|e| DbError::TransactionError(format!("BEGIN failed: {e}")))?;

        let result = body(&self.conn);

        match &result {
            Ok(_) => {
                if let Err(commit_err) = self.conn.execute_batch("COMMIT") {
                    let _ = self.conn.execute_batch("ROLLBACK");
                    return Err(DbError::TransactionError(format!(
                        "COMMIT failed: {commit_err}"
                    ))
                    .into());
                }
            }
            Err(_) => {
                log::debug!("Rolling back transaction");
                let _ = self.conn.execute_batch("ROLLBACK");
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
