//! Schema Inspector: the live structure of one table.
//!
//! Everything is read from the store's own catalog on every call. Nothing is
//! cached, so the result always reflects what a migration would act on.

use crate::error::{DbError, DbResult};
use crate::query::find_object;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tm_core::sql_utils::bare_words;
use tm_core::TableName;

/// Index origin for indexes created with `CREATE INDEX`.
///
/// Indexes with origin `u` (UNIQUE constraint) or `pk` (PRIMARY KEY) belong
/// to the table definition and are never managed by a plan.
pub const ORIGIN_CREATED: &str = "c";

/// Index origin for indexes backing a `UNIQUE` constraint.
pub const ORIGIN_UNIQUE: &str = "u";

/// One live column, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveColumn {
    pub name: String,
    /// Declared type text as written in the DDL
    pub declared_type: String,
    pub nullable: bool,
    /// Default expression text, if any
    pub default: Option<String>,
    pub primary_key: bool,
}

/// One live index on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveIndex {
    pub name: String,
    pub unique: bool,
    /// Key columns in order; expression keys appear as `<expr>`
    pub columns: Vec<String>,
    /// `c`, `u`, or `pk`
    pub origin: String,
    /// Creating DDL; absent for automatic indexes
    pub sql: Option<String>,
}

impl LiveIndex {
    /// Whether the index was created explicitly rather than by a constraint.
    pub fn is_created(&self) -> bool {
        self.origin == ORIGIN_CREATED
    }
}

/// One live trigger on the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTrigger {
    pub name: String,
    pub sql: String,
}

/// Live structure of a present table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    /// Table name as stored
    pub table: TableName,
    pub columns: Vec<LiveColumn>,
    pub indexes: Vec<LiveIndex>,
    pub triggers: Vec<LiveTrigger>,
    /// `CREATE TABLE` text as stored
    #[serde(default)]
    pub sql: Option<String>,
    /// Generated columns, which never appear in `columns`
    #[serde(default)]
    pub generated_columns: Vec<String>,
}

impl TableState {
    /// Find a column by name (case-insensitive).
    pub fn column(&self, name: &str) -> Option<&LiveColumn> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Column names in table order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i.name.eq_ignore_ascii_case(name))
    }

    pub fn has_trigger(&self, name: &str) -> bool {
        self.triggers.iter().any(|t| t.name.eq_ignore_ascii_case(name))
    }

    /// Explicitly created indexes, the ones that must be rebuilt on a swap.
    pub fn created_indexes(&self) -> impl Iterator<Item = &LiveIndex> {
        self.indexes.iter().filter(|i| i.is_created())
    }

    /// Indexes backing `UNIQUE` constraints of the table definition.
    pub fn unique_constraints(&self) -> impl Iterator<Item = &LiveIndex> {
        self.indexes.iter().filter(|i| i.origin == ORIGIN_UNIQUE)
    }

    /// Primary key columns in table order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn has_autoincrement(&self) -> bool {
        self.definition_words().iter().any(|w| w == "AUTOINCREMENT")
    }

    /// Clauses of the table definition that a column list cannot express.
    ///
    /// Reported as `CHECK`, `REFERENCES`, `COLLATE`, and `WITHOUT ROWID`.
    pub fn definition_clauses(&self) -> Vec<&'static str> {
        let words = self.definition_words();
        let has = |keyword: &str| words.iter().any(|w| w == keyword);
        let mut clauses = Vec::new();
        if has("CHECK") {
            clauses.push("CHECK");
        }
        if has("REFERENCES") {
            clauses.push("REFERENCES");
        }
        if has("COLLATE") {
            clauses.push("COLLATE");
        }
        if words.windows(2).any(|w| w[0] == "WITHOUT" && w[1] == "ROWID") {
            clauses.push("WITHOUT ROWID");
        }
        clauses
    }

    fn definition_words(&self) -> Vec<String> {
        self.sql.as_deref().map(bare_words).unwrap_or_default()
    }
}

/// Result of inspecting a table that may not exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Inspection {
    /// No table by that name
    Absent,
    Present(TableState),
}

impl Inspection {
    /// The live state, if the table exists.
    pub fn state(&self) -> Option<&TableState> {
        match self {
            Inspection::Absent => None,
            Inspection::Present(state) => Some(state),
        }
    }

    pub fn into_state(self) -> Option<TableState> {
        match self {
            Inspection::Absent => None,
            Inspection::Present(state) => Some(state),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Inspection::Absent)
    }
}

/// Read the live structure of `table`.
///
/// A missing table is an [`Inspection::Absent`] result, not an error. A name
/// held by a view or index is reported as [`DbError::CatalogError`].
pub fn inspect(conn: &Connection, table: &TableName) -> DbResult<Inspection> {
    let Some(object) = find_object(conn, table)? else {
        log::debug!("inspect {table}: absent");
        return Ok(Inspection::Absent);
    };
    if object.kind != "table" {
        return Err(DbError::CatalogError {
            table: table.to_string(),
            message: format!("name is held by a {}", object.kind),
        });
    }
    let live_name = TableName::try_from(object.name).map_err(|e| DbError::CatalogError {
        table: table.to_string(),
        message: e.to_string(),
    })?;

    let columns = read_columns(conn, &live_name)?;
    let generated_columns = read_generated_columns(conn, &live_name)?;
    let indexes = read_indexes(conn, &live_name)?;
    let triggers = read_triggers(conn, &live_name)?;
    log::debug!(
        "inspect {live_name}: {} columns, {} indexes, {} triggers",
        columns.len(),
        indexes.len(),
        triggers.len()
    );

    Ok(Inspection::Present(TableState {
        table: live_name,
        columns,
        indexes,
        triggers,
        sql: object.sql,
        generated_columns,
    }))
}

fn read_columns(conn: &Connection, table: &TableName) -> DbResult<Vec<LiveColumn>> {
    let mut stmt = conn.prepare(
        "SELECT name, type, \"notnull\", dflt_value, pk \
         FROM pragma_table_info(?1) ORDER BY cid",
    )?;
    let columns = stmt
        .query_map([table.as_str()], |row| {
            Ok(LiveColumn {
                name: row.get(0)?,
                declared_type: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                nullable: row.get::<_, i64>(2)? == 0,
                default: row.get(3)?,
                primary_key: row.get::<_, i64>(4)? > 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn read_generated_columns(conn: &Connection, table: &TableName) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT name FROM pragma_table_xinfo(?1) \
         WHERE hidden IN (2, 3) ORDER BY cid",
    )?;
    let names = stmt
        .query_map([table.as_str()], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn read_indexes(conn: &Connection, table: &TableName) -> DbResult<Vec<LiveIndex>> {
    let mut list = conn.prepare(
        "SELECT il.name, il.\"unique\", il.origin, m.sql \
         FROM pragma_index_list(?1) AS il \
         LEFT JOIN sqlite_master AS m ON m.type = 'index' AND m.name = il.name \
         ORDER BY il.name",
    )?;
    let headers = list
        .query_map([table.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)? != 0,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut keys = conn.prepare("SELECT name FROM pragma_index_info(?1) ORDER BY seqno")?;
    let mut indexes = Vec::with_capacity(headers.len());
    for (name, unique, origin, sql) in headers {
        let columns = keys
            .query_map([name.as_str()], |row| row.get::<_, Option<String>>(0))?
            .map(|r| r.map(|c| c.unwrap_or_else(|| "<expr>".to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        indexes.push(LiveIndex {
            name,
            unique,
            columns,
            origin,
            sql,
        });
    }
    Ok(indexes)
}

fn read_triggers(conn: &Connection, table: &TableName) -> DbResult<Vec<LiveTrigger>> {
    let mut stmt = conn.prepare(
        "SELECT name, sql FROM sqlite_master \
         WHERE type = 'trigger' AND tbl_name = ?1 COLLATE NOCASE \
         ORDER BY name",
    )?;
    let triggers = stmt
        .query_map([table.as_str()], |row| {
            Ok(LiveTrigger {
                name: row.get(0)?,
                sql: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(triggers)
}

#[cfg(test)]
#[path = "inspect_test.rs"]
mod tests;
