//! Run log persistence.
//!
//! Every [`MigrationRun`] is stored in `_tidemark_runs` when it starts (as
//! `pending`) and updated when it finishes. Its steps go to
//! `_tidemark_run_steps` at finalization, after any migration transaction
//! has ended, so a rolled-back rebuild cannot take its own account with it.
//! The tables live in the migrated database file itself and are created by
//! a small versioned DDL set tracked in `_tidemark_schema_version`.

use crate::ddl::MIGRATIONS;
use crate::error::{MigrateError, MigrateResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use serde::de::DeserializeOwned;
use tm_core::{
    ColumnName, MigrationRun, PlanVersion, RunMode, RunStatus, StepRecord, TableName,
};
use tm_db::Store;

/// Ensure the version table exists.
fn ensure_version_table(conn: &Connection) -> MigrateResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _tidemark_schema_version (
             version    INTEGER NOT NULL,
             applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
         );",
    )
    .map_err(|e| MigrateError::RunLog(format!("failed to create schema version table: {e}")))?;
    Ok(())
}

/// Highest applied run log DDL version, or 0 if none.
fn current_version(conn: &Connection) -> MigrateResult<i32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM _tidemark_schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| MigrateError::RunLog(format!("failed to read schema version: {e}")))
}

/// Create or upgrade the run log tables.
pub fn ensure_run_log(conn: &Connection) -> MigrateResult<()> {
    ensure_version_table(conn)?;
    let current = current_version(conn)?;

    for migration in MIGRATIONS {
        if migration.version <= current {
            continue;
        }
        log::debug!("Applying run log migration v{:03}", migration.version);

        conn.execute_batch(migration.sql).map_err(|e| {
            MigrateError::RunLog(format!("migration v{:03} failed: {e}", migration.version))
        })?;
        conn.execute(
            "INSERT INTO _tidemark_schema_version (version) VALUES (?1)",
            params![migration.version],
        )
        .map_err(|e| {
            MigrateError::RunLog(format!(
                "failed to record migration v{:03}: {e}",
                migration.version
            ))
        })?;
    }
    Ok(())
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_json<T: serde::Serialize>(value: &T) -> MigrateResult<String> {
    serde_json::to_string(value).map_err(|e| MigrateError::RunLog(e.to_string()))
}

/// Record a run as started.
pub fn begin_run(conn: &Connection, run: &MigrationRun) -> MigrateResult<()> {
    conn.execute(
        "INSERT INTO _tidemark_runs
             (run_id, table_name, plan_version, plan_checksum, from_version, mode,
              status, phase, started_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            run.run_id,
            run.table.as_str(),
            run.plan_version.as_str(),
            run.plan_checksum,
            run.from_version,
            run.mode.map(|m| m.to_string()),
            run.status.to_string(),
            run.phase.to_string(),
            timestamp(&run.started_at),
        ],
    )
    .map_err(|e| MigrateError::RunLog(format!("failed to record run {}: {e}", run.run_id)))?;
    Ok(())
}

/// Write a run's final state and its steps.
pub fn finish_run(store: &Store, run: &MigrationRun) -> MigrateResult<()> {
    let added = to_json(&run.added_columns)?;
    let captured = to_json(&run.captured_objects)?;

    store.transaction(|conn| -> MigrateResult<()> {
        conn.execute(
            "UPDATE _tidemark_runs SET
                 from_version = ?2, mode = ?3, status = ?4, phase = ?5,
                 backup_table = ?6, row_count_before = ?7, row_count_after = ?8,
                 added_columns = ?9, captured_objects = ?10, error = ?11,
                 finished_at = ?12
             WHERE run_id = ?1",
            params![
                run.run_id,
                run.from_version,
                run.mode.map(|m| m.to_string()),
                run.status.to_string(),
                run.phase.to_string(),
                run.backup_table.as_ref().map(|t| t.as_str()),
                run.row_count_before.map(|n| n as i64),
                run.row_count_after.map(|n| n as i64),
                added,
                captured,
                run.error,
                run.finished_at.as_ref().map(timestamp),
            ],
        )?;

        let mut insert = conn.prepare(
            "INSERT INTO _tidemark_run_steps (run_id, seq, at, phase, step, outcome, message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (seq, step) in run.steps.iter().enumerate() {
            insert.execute(params![
                run.run_id,
                seq as i64,
                timestamp(&step.at),
                step.phase.to_string(),
                step.step,
                step.outcome.to_string(),
                step.message,
            ])?;
        }
        Ok(())
    })
    .map_err(|e| MigrateError::RunLog(format!("failed to finalize run {}: {e}", run.run_id)))
}

/// Mark a run as rolled back.
pub fn mark_rolled_back(conn: &Connection, run_id: &str) -> MigrateResult<()> {
    conn.execute(
        "UPDATE _tidemark_runs SET status = ?2 WHERE run_id = ?1",
        params![run_id, RunStatus::RolledBack.to_string()],
    )?;
    Ok(())
}

// ── Queries ────────────────────────────────────────────────────────────

const RUN_COLUMNS: &str = "run_id, table_name, plan_version, plan_checksum, from_version, mode, \
     status, phase, backup_table, row_count_before, row_count_after, added_columns, \
     captured_objects, error, started_at, finished_at";

struct RunRow {
    run_id: String,
    table_name: String,
    plan_version: String,
    plan_checksum: String,
    from_version: Option<String>,
    mode: Option<String>,
    status: String,
    phase: String,
    backup_table: Option<String>,
    row_count_before: Option<i64>,
    row_count_after: Option<i64>,
    added_columns: String,
    captured_objects: String,
    error: Option<String>,
    started_at: String,
    finished_at: Option<String>,
}

impl RunRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            run_id: row.get(0)?,
            table_name: row.get(1)?,
            plan_version: row.get(2)?,
            plan_checksum: row.get(3)?,
            from_version: row.get(4)?,
            mode: row.get(5)?,
            status: row.get(6)?,
            phase: row.get(7)?,
            backup_table: row.get(8)?,
            row_count_before: row.get(9)?,
            row_count_after: row.get(10)?,
            added_columns: row.get(11)?,
            captured_objects: row.get(12)?,
            error: row.get(13)?,
            started_at: row.get(14)?,
            finished_at: row.get(15)?,
        })
    }

    fn into_run(self, steps: Vec<StepRecord>) -> MigrateResult<MigrationRun> {
        let added: Vec<ColumnName> = from_json(&self.added_columns)?;
        Ok(MigrationRun {
            run_id: self.run_id,
            plan_version: self.plan_version.parse()?,
            table: TableName::try_from(self.table_name)?,
            plan_checksum: self.plan_checksum,
            from_version: self.from_version,
            started_at: parse_timestamp(&self.started_at)?,
            finished_at: self.finished_at.as_deref().map(parse_timestamp).transpose()?,
            mode: self.mode.as_deref().map(parse_enum).transpose()?,
            status: self.status.parse()?,
            phase: parse_enum(&self.phase)?,
            backup_table: self
                .backup_table
                .map(|t| TableName::try_from(t))
                .transpose()?,
            row_count_before: self.row_count_before.map(|n| n.max(0) as u64),
            row_count_after: self.row_count_after.map(|n| n.max(0) as u64),
            added_columns: added,
            captured_objects: from_json(&self.captured_objects)?,
            steps,
            error: self.error,
        })
    }
}

fn from_json<T: DeserializeOwned>(text: &str) -> MigrateResult<T> {
    serde_json::from_str(text).map_err(|e| MigrateError::RunLog(format!("bad stored value: {e}")))
}

/// Parse a stored enum through its serde name.
fn parse_enum<T: DeserializeOwned>(text: &str) -> MigrateResult<T> {
    serde_json::from_value(serde_json::Value::String(text.to_string()))
        .map_err(|e| MigrateError::RunLog(format!("bad stored value '{text}': {e}")))
}

fn parse_timestamp(text: &str) -> MigrateResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| MigrateError::RunLog(format!("bad timestamp '{text}': {e}")))
}

fn load_steps(conn: &Connection, run_id: &str) -> MigrateResult<Vec<StepRecord>> {
    let mut stmt = conn.prepare(
        "SELECT at, phase, step, outcome, message FROM _tidemark_run_steps
         WHERE run_id = ?1 ORDER BY seq",
    )?;
    let raw = stmt
        .query_map([run_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    raw.into_iter()
        .map(|(at, phase, step, outcome, message)| {
            Ok(StepRecord {
                at: parse_timestamp(&at)?,
                phase: parse_enum(&phase)?,
                step,
                outcome: parse_enum(&outcome)?,
                message,
            })
        })
        .collect()
}

fn query_runs(
    conn: &Connection,
    table: Option<&str>,
    newest_first: bool,
) -> MigrateResult<Vec<MigrationRun>> {
    let sql = format!(
        "SELECT {RUN_COLUMNS} FROM _tidemark_runs
         WHERE ?1 IS NULL OR table_name = ?1 COLLATE NOCASE
         ORDER BY started_at {order}, rowid {order}",
        order = if newest_first { "DESC" } else { "ASC" }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([table], RunRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|row| {
            let steps = load_steps(conn, &row.run_id)?;
            row.into_run(steps)
        })
        .collect()
}

/// All runs, newest first, optionally for one table.
pub fn list_runs(conn: &Connection, table: Option<&str>) -> MigrateResult<Vec<MigrationRun>> {
    query_runs(conn, table, true)
}

/// The most recent succeeded run of `version` on `table`, optionally
/// restricted to one mode. Rollback runs are only returned when asked for.
pub fn latest_succeeded(
    conn: &Connection,
    table: &str,
    version: &PlanVersion,
    mode: Option<RunMode>,
) -> MigrateResult<Option<MigrationRun>> {
    Ok(query_runs(conn, Some(table), true)?.into_iter().find(|run| {
        run.status == RunStatus::Succeeded
            && &run.plan_version == version
            && match mode {
                Some(mode) => run.mode == Some(mode),
                None => run.mode != Some(RunMode::Rollback),
            }
    }))
}

/// The highest version below `version` that a succeeded, not rolled back
/// run applied to `table`.
pub fn applied_version_before(
    conn: &Connection,
    table: &str,
    version: &PlanVersion,
) -> MigrateResult<Option<PlanVersion>> {
    Ok(query_runs(conn, Some(table), false)?
        .into_iter()
        .filter(|run| {
            run.status == RunStatus::Succeeded
                && run.mode != Some(RunMode::Rollback)
                && &run.plan_version < version
        })
        .map(|run| run.plan_version)
        .max())
}

/// Checksum recorded by the latest succeeded application of `version`.
pub fn previous_checksum(
    conn: &Connection,
    table: &str,
    version: &PlanVersion,
) -> MigrateResult<Option<String>> {
    Ok(latest_succeeded(conn, table, version, None)?.map(|run| run.plan_checksum))
}

#[cfg(test)]
#[path = "run_log_test.rs"]
mod tests;
