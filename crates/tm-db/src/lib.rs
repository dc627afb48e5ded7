//! tm-db - Store access for tidemark
//!
//! Wraps the SQLite connection and reads live table structure. Nothing in
//! this crate decides how a table should change; that is the engine's job.

pub mod error;
pub mod inspect;
pub mod query;
pub mod store;

pub use error::{DbError, DbResult};
pub use inspect::{inspect, Inspection, LiveColumn, LiveIndex, LiveTrigger, TableState};
pub use query::{find_object, list_tables, row_count, table_exists, NamedObject};
pub use store::Store;

pub use rusqlite::Connection;
