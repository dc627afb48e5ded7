//! Strongly-typed identifiers for tables, columns, indexes, and triggers.
//!
//! Prevents accidental mixing of a column name with an index name, which
//! matters here because SQLite puts tables, indexes, and triggers in one
//! shared namespace.

use crate::newtype_string::define_identifier;

define_identifier! {
    /// Name of a table in the store.
    pub struct TableName;
}

define_identifier! {
    /// Name of a column within one table.
    pub struct ColumnName;
}

define_identifier! {
    /// Name of an index. Unique across the whole store.
    pub struct IndexName;
}

define_identifier! {
    /// Name of a trigger. Unique across the whole store.
    pub struct TriggerName;
}

impl TableName {
    /// Name of the shadow table used while rebuilding this table.
    pub fn shadow(&self) -> TableName {
        TableName(format!("{}__rebuild", self.0))
    }

    /// Name of the backup table a rebuild from `from_version` leaves behind.
    pub fn backup(&self, from_version: &str) -> TableName {
        TableName(format!("{}_{}_backup", self.0, from_version))
    }
}

#[cfg(test)]
#[path = "names_test.rs"]
mod tests;
