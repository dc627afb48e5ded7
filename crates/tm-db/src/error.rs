//! Error types for tm-db

use thiserror::Error;

/// Store and inspection errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Query execution error (D002)
    #[error("[D002] SQL execution failed: {0}")]
    ExecutionError(String),

    /// Table not found (D003)
    #[error("[D003] Table not found: {0}")]
    TableNotFound(String),

    /// Transaction management error (D004)
    #[error("[D004] Transaction failed: {0}")]
    TransactionError(String),

    /// Live catalog returned something unexpected (D005)
    #[error("[D005] Unexpected catalog state for '{table}': {message}")]
    CatalogError { table: String, message: String },

    /// SQLite driver error with preserved source chain (D006)
    #[error("[D006] SQLite error: {0}")]
    Sqlite(#[source] rusqlite::Error),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        // SQLite reports a missing table only through the message text.
        match &err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.starts_with("no such table") => {
                DbError::TableNotFound(msg.clone())
            }
            _ => DbError::Sqlite(err),
        }
    }
}
