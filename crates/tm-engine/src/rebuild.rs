//! Rebuild Migrator: shadow table, copy, and swap.
//!
//! Used for changes `ALTER TABLE` cannot make in place. The shadow table is
//! always built from the plan's full column list, never by editing the live
//! table's DDL. Everything from shadow creation to recreating the plan's
//! indexes and triggers runs in one write transaction, so a failure at any
//! step leaves the original table exactly as it was.

use crate::error::{MigrateError, MigrateResult};
use crate::objects::{create_missing, CreatedObjects};
use rusqlite::Connection;
use tm_core::sql_utils::quote_ident;
use tm_core::{MigrationPlan, TableName};
use tm_db::{find_object, row_count, Store, TableState};

/// One target column and where its data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyColumn {
    pub target: String,
    /// Live column copied into `target`; `None` leaves the declared default
    pub source: Option<String>,
}

/// What a completed rebuild did.
#[derive(Debug, Clone)]
pub struct RebuildOutcome {
    pub backup: TableName,
    pub row_count_before: u64,
    pub row_count_after: u64,
    pub copy_columns: Vec<CopyColumn>,
    /// DDL of the original table's indexes and triggers, dropped before the
    /// swap and replayed by rollback
    pub captured: Vec<String>,
    pub created: CreatedObjects,
}

/// Map each plan column to the live column its data is copied from.
///
/// A column present live copies itself. A missing column with a
/// `renamed_from` source present live copies the source. Anything else is
/// filled with its declared default.
pub fn copy_columns(plan: &MigrationPlan, existing: &TableState) -> Vec<CopyColumn> {
    plan.columns
        .iter()
        .map(|spec| {
            let source = existing
                .column(&spec.name)
                .or_else(|| {
                    spec.renamed_from
                        .as_ref()
                        .and_then(|from| existing.column(from))
                })
                .map(|live| live.name.clone());
            CopyColumn {
                target: spec.name.to_string(),
                source,
            }
        })
        .collect()
}

/// `INSERT OR IGNORE ... SELECT` moving rows from `from` into `into`.
///
/// `OR IGNORE` skips rows the target's constraints reject instead of
/// aborting, so a lossy copy shows up in the row count check.
pub fn copy_sql(from: &TableName, into: &TableName, columns: &[CopyColumn]) -> String {
    let (targets, sources): (Vec<String>, Vec<String>) = columns
        .iter()
        .filter_map(|c| c.source.as_ref().map(|s| (quote_ident(&c.target), quote_ident(s))))
        .unzip();

    if targets.is_empty() {
        // Nothing carries over; keep one row per source row
        return format!(
            "INSERT OR IGNORE INTO {} (rowid) SELECT rowid FROM {}",
            into.quoted(),
            from.quoted()
        );
    }
    format!(
        "INSERT OR IGNORE INTO {} ({}) SELECT {} FROM {}",
        into.quoted(),
        targets.join(", "),
        sources.join(", "),
        from.quoted()
    )
}

/// Fail if the backup or shadow name is already taken.
pub fn preflight(
    conn: &Connection,
    plan: &MigrationPlan,
    backup: &TableName,
) -> MigrateResult<()> {
    if find_object(conn, backup)?.is_some() {
        return Err(MigrateError::BackupNameCollision {
            table: plan.table.to_string(),
            backup: backup.to_string(),
        });
    }
    let shadow = plan.table.shadow();
    if find_object(conn, &shadow)?.is_some() {
        return Err(MigrateError::ShadowTableExists {
            shadow: shadow.to_string(),
        });
    }
    Ok(())
}

/// Rebuild `existing` into the structure of `plan`, keeping the original as
/// `backup`.
pub fn rebuild(
    store: &Store,
    plan: &MigrationPlan,
    existing: &TableState,
    backup: &TableName,
) -> MigrateResult<RebuildOutcome> {
    preflight(store.conn(), plan, backup)?;

    let live = &existing.table;
    let shadow = plan.table.shadow();
    let columns = copy_columns(plan, existing);

    store.transaction(|conn| {
        let create = plan.create_table_sql(&shadow);
        log::debug!("{create}");
        conn.execute_batch(&create)?;

        let copy = copy_sql(live, &shadow, &columns);
        log::debug!("{copy}");
        conn.execute_batch(&copy)?;

        let before = row_count(conn, live)?;
        let after = row_count(conn, &shadow)?;
        if before != after {
            return Err(MigrateError::RowCountMismatch {
                table: plan.table.to_string(),
                before,
                after,
            });
        }
        if plan.autoincrement() && existing.has_autoincrement() {
            carry_sequence(conn, live, &shadow)?;
        }

        let captured = drop_own_objects(conn, existing)?;
        rename_tables(conn, &[(live, backup), (&shadow, &plan.table)])?;
        let created = create_missing(conn, plan, &plan.table, None)?;

        Ok(RebuildOutcome {
            backup: backup.clone(),
            row_count_before: before,
            row_count_after: after,
            copy_columns: columns.clone(),
            captured,
            created,
        })
    })
}

/// Raise the `AUTOINCREMENT` counter of `into` to the one of `from`, so keys
/// handed out before the rebuild are never reused.
fn carry_sequence(conn: &Connection, from: &TableName, into: &TableName) -> MigrateResult<()> {
    let seq: Option<i64> = conn.query_row(
        "SELECT MAX(seq) FROM sqlite_sequence WHERE name IN (?1, ?2)",
        [from.as_str(), into.as_str()],
        |row| row.get(0),
    )?;
    let Some(seq) = seq else {
        return Ok(());
    };
    conn.execute("DELETE FROM sqlite_sequence WHERE name = ?1", [into.as_str()])?;
    conn.execute(
        "INSERT INTO sqlite_sequence (name, seq) VALUES (?1, ?2)",
        rusqlite::params![into.as_str(), seq],
    )?;
    log::debug!("{into}: AUTOINCREMENT continues after {seq}");
    Ok(())
}

/// Drop the original table's explicitly created indexes and its triggers,
/// returning their DDL.
fn drop_own_objects(conn: &Connection, existing: &TableState) -> MigrateResult<Vec<String>> {
    let mut captured = Vec::new();
    for index in existing.created_indexes() {
        if let Some(sql) = &index.sql {
            captured.push(sql.clone());
        }
        conn.execute_batch(&format!("DROP INDEX {}", quote_ident(&index.name)))?;
    }
    for trigger in &existing.triggers {
        captured.push(trigger.sql.clone());
        conn.execute_batch(&format!("DROP TRIGGER {}", quote_ident(&trigger.name)))?;
    }
    Ok(captured)
}

/// Apply `renames` in order with `legacy_alter_table` set, so the renames
/// do not rewrite references in other objects.
pub(crate) fn rename_tables(
    conn: &Connection,
    renames: &[(&TableName, &TableName)],
) -> MigrateResult<()> {
    conn.execute_batch("PRAGMA legacy_alter_table = ON")?;
    let result = renames.iter().try_for_each(|(from, to)| {
        log::debug!("rename {from} -> {to}");
        conn.execute_batch(&format!(
            "ALTER TABLE {} RENAME TO {}",
            from.quoted(),
            to.quoted()
        ))
    });
    conn.execute_batch("PRAGMA legacy_alter_table = OFF")?;
    result?;
    Ok(())
}

#[cfg(test)]
#[path = "rebuild_test.rs"]
mod tests;
