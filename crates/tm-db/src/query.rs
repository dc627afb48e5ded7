//! Small catalog queries shared by the inspector and the engine.
//!
//! Functions take a bare [`Connection`] so they can run both standalone and
//! inside a [`Store::transaction`](crate::Store::transaction) body.

use crate::error::DbResult;
use rusqlite::{Connection, OptionalExtension};
use tm_core::TableName;

/// An object occupying a name in the store's shared namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedObject {
    /// `table`, `index`, `view`, or `trigger`
    pub kind: String,
    /// Name as stored
    pub name: String,
    /// Table the object belongs to (itself, for tables and views)
    pub table: String,
    /// Creating DDL; absent for automatic indexes
    pub sql: Option<String>,
}

/// Look up whatever object currently holds `name` (case-insensitive).
pub fn find_object(conn: &Connection, name: &str) -> DbResult<Option<NamedObject>> {
    let found = conn
        .query_row(
            "SELECT type, name, tbl_name, sql FROM sqlite_master \
             WHERE name = ?1 COLLATE NOCASE",
            [name],
            |row| {
                Ok(NamedObject {
                    kind: row.get(0)?,
                    name: row.get(1)?,
                    table: row.get(2)?,
                    sql: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(found)
}

/// Whether a table named `name` exists (case-insensitive).
pub fn table_exists(conn: &Connection, name: &str) -> DbResult<bool> {
    Ok(find_object(conn, name)?.is_some_and(|o| o.kind == "table"))
}

/// Number of rows in `table`.
pub fn row_count(conn: &Connection, table: &TableName) -> DbResult<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.quoted()),
        [],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

/// Names of all user tables, sorted.
pub fn list_tables(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM sqlite_master \
         WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
         ORDER BY name",
    )?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}
