//! Rollback: restore a rebuild's backup over the live table.
//!
//! Rollback only runs when the live table still has exactly the structure
//! the rebuild produced. Anything else suggests changes made after the
//! migration, and dropping the live table would lose them.

use crate::error::{MigrateError, MigrateResult};
use crate::rebuild::rename_tables;
use tm_core::{MigrationPlan, MigrationRun};
use tm_db::{find_object, inspect, row_count, Inspection, Store, TableState};

/// What a completed rollback did.
#[derive(Debug, Clone)]
pub struct RollbackOutcome {
    pub backup: tm_core::TableName,
    pub restored_rows: u64,
    /// Captured index and trigger DDL replayed on the restored table
    pub replayed: usize,
}

/// Describe how `state` differs from the columns `plan` declares, comparing
/// names in order and declared types. `None` when they match.
pub fn structure_difference(plan: &MigrationPlan, state: &TableState) -> Option<String> {
    let live: Vec<&str> = state.column_names();
    let planned: Vec<&str> = plan.columns.iter().map(|c| c.name.as_str()).collect();
    let same_names = live.len() == planned.len()
        && live
            .iter()
            .zip(&planned)
            .all(|(l, p)| l.eq_ignore_ascii_case(p));
    if !same_names {
        return Some(format!(
            "columns are [{}], plan has [{}]",
            live.join(", "),
            planned.join(", ")
        ));
    }

    for spec in &plan.columns {
        if let Some(live) = state.column(&spec.name) {
            if !spec.column_type.matches_declared(&live.declared_type) {
                return Some(format!(
                    "column '{}' is {}, plan has {}",
                    spec.name,
                    live.declared_type,
                    spec.column_type.sql()
                ));
            }
        }
    }
    None
}

/// Undo `rebuild_run`, which applied `plan` to its table.
pub fn rollback(
    store: &Store,
    plan: &MigrationPlan,
    rebuild_run: &MigrationRun,
) -> MigrateResult<RollbackOutcome> {
    let missing = |reason: String| MigrateError::BackupMissing {
        table: plan.table.to_string(),
        version: plan.version.to_string(),
        reason,
    };

    let backup = rebuild_run
        .backup_table
        .clone()
        .ok_or_else(|| missing(format!("run {} recorded no backup table", rebuild_run.run_id)))?;
    match find_object(store.conn(), &backup)? {
        Some(obj) if obj.kind == "table" => {}
        _ => return Err(missing(format!("backup table '{backup}' no longer exists"))),
    }

    let state = match inspect(store.conn(), &plan.table)? {
        Inspection::Absent => {
            return Err(MigrateError::TableAbsent {
                table: plan.table.to_string(),
            })
        }
        Inspection::Present(state) => state,
    };
    if let Some(details) = structure_difference(plan, &state) {
        return Err(MigrateError::RollbackStructureMismatch {
            table: plan.table.to_string(),
            details,
        });
    }

    store.transaction(|conn| {
        log::debug!("DROP TABLE {}", state.table);
        conn.execute_batch(&format!("DROP TABLE {}", state.table.quoted()))?;
        rename_tables(conn, &[(&backup, &plan.table)])?;
        for ddl in &rebuild_run.captured_objects {
            log::debug!("{ddl}");
            conn.execute_batch(ddl)?;
        }
        Ok(RollbackOutcome {
            restored_rows: row_count(conn, &plan.table)?,
            backup: backup.clone(),
            replayed: rebuild_run.captured_objects.len(),
        })
    })
}

#[cfg(test)]
#[path = "rollback_test.rs"]
mod tests;
