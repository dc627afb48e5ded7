//! Additive Migrator: in-place column adds.
//!
//! Each `ADD COLUMN` is its own statement outside any explicit transaction,
//! so a failure leaves the columns added before it in place and the table in
//! a state the next run can pick up from.

use crate::error::{MigrateError, MigrateResult};
use crate::objects::{create_missing, CreatedObjects};
use rusqlite::Connection;
use tm_core::{ColumnSpec, MigrationPlan};
use tm_db::{Store, TableState};

/// What an additive application changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedSet {
    /// Columns added, in order
    pub added_columns: Vec<String>,
    pub created: CreatedObjects,
}

impl AppliedSet {
    pub fn is_empty(&self) -> bool {
        self.added_columns.is_empty() && self.created.is_empty()
    }
}

/// Add every column in `columns` that `existing` lacks.
///
/// Columns are matched by name only; type drift on a present column is not
/// corrected here. Returns the added column names. On failure the error
/// carries the names added before it.
pub fn apply_additive(
    conn: &Connection,
    existing: &TableState,
    columns: &[ColumnSpec],
) -> MigrateResult<Vec<String>> {
    let table = &existing.table;
    let mut applied = Vec::new();

    for column in columns.iter().filter(|c| !existing.has_column(&c.name)) {
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {}",
            table.quoted(),
            column.definition_sql()
        );
        log::debug!("{sql}");
        if let Err(e) = conn.execute_batch(&sql) {
            return Err(MigrateError::ColumnAddFailed {
                table: table.to_string(),
                column: column.name.to_string(),
                applied,
                message: e.to_string(),
            });
        }
        applied.push(column.name.to_string());
    }
    Ok(applied)
}

/// Apply `plan` additively: missing columns first, then missing indexes and
/// triggers in one transaction.
pub fn apply_plan_additive(
    store: &Store,
    plan: &MigrationPlan,
    existing: &TableState,
) -> MigrateResult<AppliedSet> {
    let added_columns = apply_additive(store.conn(), existing, &plan.columns)?;
    let created =
        store.transaction(|conn| create_missing(conn, plan, &existing.table, Some(existing)))?;
    Ok(AppliedSet {
        added_columns,
        created,
    })
}

#[cfg(test)]
#[path = "additive_test.rs"]
mod tests;
