//! Migration Runner: inspect, migrate, verify, record.
//!
//! The runner drives one [`MigrationRun`] per plan application through
//! `NotStarted -> Inspecting -> {Bootstrap | Additive | Rebuild} ->
//! Verifying -> {Succeeded | Failed}`. Failures of the migration itself end
//! up in [`RunOutcome::error`]; only a failure to write the run log is
//! returned as `Err`.

use crate::additive::apply_plan_additive;
use crate::bootstrap::bootstrap;
use crate::confirm::Confirmation;
use crate::diff::{diff_plan, MigrationDiff};
use crate::error::{MigrateError, MigrateResult};
use crate::objects::{check_name_collisions, CreatedObjects};
use crate::rebuild::{preflight, rebuild};
use crate::rollback::rollback;
use crate::run_log;
use crate::verify::{verify, Mismatch};
use tm_core::{
    MigrationPlan, MigrationRun, PlanCatalog, PlanVersion, RunMode, RunPhase, RunStatus,
    StepOutcome,
};
use tm_db::{inspect, Inspection, Store, TableState};

/// `fromVersion` used when neither the run log nor the catalog knows an
/// earlier version of the table.
pub const BASE_VERSION: &str = "base";

/// Result of one plan application or rollback.
#[derive(Debug)]
pub struct RunOutcome {
    /// The finalized, persisted run record
    pub run: MigrationRun,
    /// Verified live state on success
    pub state: Option<TableState>,
    /// Why the run failed
    pub error: Option<MigrateError>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.run.is_success()
    }
}

/// Applies plans to one store.
pub struct MigrationRunner<'a> {
    store: &'a Store,
    confirmation: Confirmation,
    catalog: Option<&'a PlanCatalog>,
    force_rebuild: bool,
}

impl<'a> MigrationRunner<'a> {
    /// Create a runner, creating or upgrading the run log tables.
    pub fn new(store: &'a Store, confirmation: Confirmation) -> MigrateResult<Self> {
        run_log::ensure_run_log(store.conn())?;
        Ok(Self {
            store,
            confirmation,
            catalog: None,
            force_rebuild: false,
        })
    }

    /// Resolve plans and backup names against `catalog`.
    pub fn with_catalog(mut self, catalog: &'a PlanCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Take the rebuild path even when the additive path would do.
    pub fn force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// Apply every catalog plan at `version`, optionally for one table.
    ///
    /// Stops after the first plan that does not succeed.
    pub fn apply_version(
        &mut self,
        version: &PlanVersion,
        table: Option<&str>,
    ) -> MigrateResult<Vec<RunOutcome>> {
        let mut outcomes = Vec::new();
        for plan in self.plans_at(version, table)? {
            let outcome = self.apply(plan)?;
            let stop = !outcome.is_success();
            outcomes.push(outcome);
            if stop {
                break;
            }
        }
        Ok(outcomes)
    }

    /// Roll back every catalog plan at `version`, optionally for one table.
    ///
    /// Stops after the first rollback that does not succeed.
    pub fn rollback_version(
        &mut self,
        version: &PlanVersion,
        table: Option<&str>,
    ) -> MigrateResult<Vec<RunOutcome>> {
        let mut outcomes = Vec::new();
        for plan in self.plans_at(version, table)? {
            let outcome = self.rollback(plan)?;
            let stop = !outcome.is_success();
            outcomes.push(outcome);
            if stop {
                break;
            }
        }
        Ok(outcomes)
    }

    fn plans_at(
        &self,
        version: &PlanVersion,
        table: Option<&str>,
    ) -> MigrateResult<Vec<&'a MigrationPlan>> {
        let not_found = || MigrateError::PlanNotFound {
            version: version.to_string(),
            table: table.map(str::to_string),
        };
        let plans = self.catalog.ok_or_else(not_found)?.at_version(version, table);
        if plans.is_empty() {
            return Err(not_found());
        }
        Ok(plans)
    }

    /// Apply one plan to its table.
    pub fn apply(&mut self, plan: &MigrationPlan) -> MigrateResult<RunOutcome> {
        let mut run = MigrationRun::new(plan.table.clone(), plan.version.clone(), plan.checksum()?);
        run_log::begin_run(self.store.conn(), &run)?;
        log::info!("Applying {} {} (run {})", plan.table, plan.version, run.run_id);

        let result = self.execute(plan, &mut run);
        self.finalize(run, result)
    }

    /// Restore the backup left by the latest succeeded rebuild of `plan`.
    pub fn rollback(&mut self, plan: &MigrationPlan) -> MigrateResult<RunOutcome> {
        let mut run = MigrationRun::new(plan.table.clone(), plan.version.clone(), plan.checksum()?);
        run.mode = Some(RunMode::Rollback);
        run_log::begin_run(self.store.conn(), &run)?;
        log::info!("Rolling back {} {} (run {})", plan.table, plan.version, run.run_id);

        let result = self.execute_rollback(plan, &mut run);
        self.finalize(run, result)
    }

    fn finalize(
        &self,
        mut run: MigrationRun,
        result: MigrateResult<Option<TableState>>,
    ) -> MigrateResult<RunOutcome> {
        let result = result.and_then(|state| {
            run.succeed()?;
            Ok(state)
        });

        let outcome = match result {
            Ok(state) => {
                log::info!(
                    "{} {}: {} succeeded (run {})",
                    run.table,
                    run.plan_version,
                    run.mode.map(|m| m.to_string()).unwrap_or_default(),
                    run.run_id
                );
                RunOutcome {
                    run,
                    state,
                    error: None,
                }
            }
            Err(err) => {
                run.fail(err.run_status(), err.to_string());
                if err.needs_repair() {
                    log::error!(
                        "{} {}: live table needs manual repair, backup retained: {err}",
                        run.table,
                        run.plan_version
                    );
                } else if run.status == RunStatus::PartiallyFailed {
                    log::warn!("{} {}: partially applied: {err}", run.table, run.plan_version);
                } else {
                    log::warn!("{} {}: failed: {err}", run.table, run.plan_version);
                }
                RunOutcome {
                    run,
                    state: None,
                    error: Some(err),
                }
            }
        };

        run_log::finish_run(self.store, &outcome.run)?;
        Ok(outcome)
    }

    fn execute(
        &mut self,
        plan: &MigrationPlan,
        run: &mut MigrationRun,
    ) -> MigrateResult<Option<TableState>> {
        let store = self.store;
        let conn = store.conn();
        run.advance(RunPhase::Inspecting)?;
        plan.validate()?;

        if let Some(previous) = run_log::previous_checksum(conn, &plan.table, &plan.version)? {
            if previous != run.plan_checksum {
                return Err(MigrateError::PlanChanged {
                    table: plan.table.to_string(),
                    version: plan.version.to_string(),
                    previous,
                    current: run.plan_checksum.clone(),
                });
            }
        }

        let live = inspect(conn, &plan.table)?;
        run.record("inspect", StepOutcome::Ok, describe(&live));

        let diff = diff_plan(plan, &live, self.force_rebuild);
        if !diff.undeclared.is_empty() {
            return Err(MigrateError::UndeclaredColumns {
                table: plan.table.to_string(),
                columns: diff.undeclared,
            });
        }
        if diff.mode == RunMode::Rebuild && !diff.undeclared_constraints.is_empty() {
            return Err(MigrateError::UndeclaredConstraints {
                table: plan.table.to_string(),
                constraints: diff.undeclared_constraints,
            });
        }
        check_name_collisions(conn, plan)?;
        run.mode = Some(diff.mode);
        run.record("decide", StepOutcome::Ok, describe_decision(&diff));

        let expected_rows = match live {
            Inspection::Absent => {
                self.run_bootstrap(plan, run)?;
                None
            }
            Inspection::Present(state) if diff.mode == RunMode::Rebuild => {
                Some(self.run_rebuild(plan, &state, run)?)
            }
            Inspection::Present(state) => {
                self.run_additive(plan, &state, run)?;
                None
            }
        };

        run.advance(RunPhase::Verifying)?;
        let verification = verify(conn, plan, expected_rows)?;
        if !verification.ok() {
            for mismatch in &verification.mismatches {
                run.record("verify", StepOutcome::Failed, mismatch.to_string());
            }
            return Err(MigrateError::VerificationMismatch {
                table: plan.table.to_string(),
                mismatches: verification.mismatches,
            });
        }
        run.record("verify", StepOutcome::Ok, "live table matches plan");
        Ok(verification.state)
    }

    fn run_bootstrap(&mut self, plan: &MigrationPlan, run: &mut MigrationRun) -> MigrateResult<()> {
        run.advance(RunPhase::Bootstrap)?;
        let created = bootstrap(self.store, plan)?;
        run.record(
            "create table",
            StepOutcome::Ok,
            format!("created '{}' with {} columns", plan.table, plan.columns.len()),
        );
        record_created(run, &created);
        Ok(())
    }

    fn run_additive(
        &mut self,
        plan: &MigrationPlan,
        state: &TableState,
        run: &mut MigrationRun,
    ) -> MigrateResult<()> {
        run.advance(RunPhase::Additive)?;
        match apply_plan_additive(self.store, plan, state) {
            Ok(applied) => {
                record_added(plan, run, &applied.added_columns);
                if applied.added_columns.is_empty() {
                    run.record("add columns", StepOutcome::Skipped, "all columns present");
                }
                record_created(run, &applied.created);
                Ok(())
            }
            Err(err) => {
                if let MigrateError::ColumnAddFailed {
                    applied,
                    column,
                    message,
                    ..
                } = &err
                {
                    record_added(plan, run, applied);
                    run.record(
                        "add column",
                        StepOutcome::Failed,
                        format!("{column}: {message}"),
                    );
                }
                Err(err)
            }
        }
    }

    /// Returns the row count the rebuilt table must have.
    fn run_rebuild(
        &mut self,
        plan: &MigrationPlan,
        state: &TableState,
        run: &mut MigrationRun,
    ) -> MigrateResult<u64> {
        let from_version = self.resolve_from_version(plan)?;
        let backup = plan.table.backup(&from_version);
        run.from_version = Some(from_version);
        preflight(self.store.conn(), plan, &backup)?;

        let question = format!(
            "Rebuild table '{}' for {}? The original will be kept as '{}'.",
            plan.table, plan.version, backup
        );
        if !self.confirmation.confirm(&question) {
            return Err(MigrateError::ConfirmationDeclined {
                table: plan.table.to_string(),
                action: "Rebuild".to_string(),
            });
        }

        run.advance(RunPhase::Rebuild)?;
        run.backup_table = Some(backup.clone());
        let outcome = match rebuild(self.store, plan, state, &backup) {
            Ok(outcome) => outcome,
            Err(err) => {
                if let MigrateError::RowCountMismatch { before, after, .. } = &err {
                    run.row_count_before = Some(*before);
                    run.row_count_after = Some(*after);
                }
                // The whole section rolled back, so no backup was left behind
                run.backup_table = None;
                run.record("rebuild", StepOutcome::Failed, "rolled back; original table untouched");
                return Err(err);
            }
        };

        let copied: Vec<String> = outcome
            .copy_columns
            .iter()
            .filter_map(|c| match &c.source {
                Some(source) if !source.eq_ignore_ascii_case(&c.target) => {
                    Some(format!("{source} -> {}", c.target))
                }
                Some(source) => Some(source.clone()),
                None => None,
            })
            .collect();
        let defaulted: Vec<&str> = outcome
            .copy_columns
            .iter()
            .filter(|c| c.source.is_none())
            .map(|c| c.target.as_str())
            .collect();

        run.record(
            "shadow",
            StepOutcome::Ok,
            format!("created '{}' with {} columns", plan.table.shadow(), plan.columns.len()),
        );
        run.record("copy", StepOutcome::Ok, format!("copied [{}]", copied.join(", ")));
        if !defaulted.is_empty() {
            run.record(
                "copy",
                StepOutcome::Ok,
                format!("filled with defaults: [{}]", defaulted.join(", ")),
            );
        }
        run.record(
            "row count",
            StepOutcome::Ok,
            format!("{} rows before, {} after", outcome.row_count_before, outcome.row_count_after),
        );
        run.record(
            "swap",
            StepOutcome::Ok,
            format!(
                "'{}' -> '{}', '{}' -> '{}'",
                state.table,
                outcome.backup,
                plan.table.shadow(),
                plan.table
            ),
        );
        if !outcome.captured.is_empty() {
            run.record(
                "capture",
                StepOutcome::Ok,
                format!("{} index/trigger definitions saved for rollback", outcome.captured.len()),
            );
        }
        record_created(run, &outcome.created);

        run.row_count_before = Some(outcome.row_count_before);
        run.row_count_after = Some(outcome.row_count_after);
        run.captured_objects = outcome.captured;
        Ok(outcome.row_count_before)
    }

    fn execute_rollback(
        &mut self,
        plan: &MigrationPlan,
        run: &mut MigrationRun,
    ) -> MigrateResult<Option<TableState>> {
        let store = self.store;
        let conn = store.conn();
        run.advance(RunPhase::Inspecting)?;

        let rebuild_mode = Some(RunMode::Rebuild);
        let target = run_log::latest_succeeded(conn, &plan.table, &plan.version, rebuild_mode)?
            .ok_or_else(|| MigrateError::BackupMissing {
                table: plan.table.to_string(),
                version: plan.version.to_string(),
                reason: "no succeeded rebuild run is recorded".to_string(),
            })?;
        run.from_version = target.from_version.clone();
        run.backup_table = target.backup_table.clone();
        run.record(
            "locate",
            StepOutcome::Ok,
            format!(
                "rebuild run {} left backup '{}'",
                target.run_id,
                target
                    .backup_table
                    .as_ref()
                    .map(|t| t.as_str())
                    .unwrap_or("?")
            ),
        );

        let question = format!(
            "Roll back '{}' {}: drop the live table and restore its backup?",
            plan.table, plan.version
        );
        if !self.confirmation.confirm(&question) {
            return Err(MigrateError::ConfirmationDeclined {
                table: plan.table.to_string(),
                action: "Rollback".to_string(),
            });
        }

        run.advance(RunPhase::RollingBack)?;
        let outcome = rollback(self.store, plan, &target)?;
        run.row_count_after = Some(outcome.restored_rows);
        run.record(
            "restore",
            StepOutcome::Ok,
            format!(
                "'{}' restored as '{}' with {} rows, {} definitions replayed",
                outcome.backup, plan.table, outcome.restored_rows, outcome.replayed
            ),
        );

        run.advance(RunPhase::Verifying)?;
        let state = inspect(conn, &plan.table)?.into_state();
        let mut mismatches = Vec::new();
        if state.is_none() {
            mismatches.push(Mismatch::TableAbsent);
        }
        if let Some(expected) = target.row_count_before {
            if expected != outcome.restored_rows {
                mismatches.push(Mismatch::RowCount {
                    expected,
                    actual: outcome.restored_rows,
                });
            }
        }
        if !mismatches.is_empty() {
            return Err(MigrateError::VerificationMismatch {
                table: plan.table.to_string(),
                mismatches,
            });
        }
        run.record("verify", StepOutcome::Ok, "restored row count matches");

        run_log::mark_rolled_back(conn, &target.run_id)?;
        run.record(
            "mark",
            StepOutcome::Ok,
            format!("run {} marked rolled back", target.run_id),
        );
        Ok(state)
    }

    /// Version the table is at before `plan`: the run log first, then the
    /// catalog's previous plan, then [`BASE_VERSION`].
    fn resolve_from_version(&self, plan: &MigrationPlan) -> MigrateResult<String> {
        if let Some(version) =
            run_log::applied_version_before(self.store.conn(), &plan.table, &plan.version)?
        {
            return Ok(version.to_string());
        }
        if let Some(previous) = self
            .catalog
            .and_then(|c| c.predecessor(&plan.table, &plan.version))
        {
            return Ok(previous.version.to_string());
        }
        Ok(BASE_VERSION.to_string())
    }
}

fn describe(live: &Inspection) -> String {
    match live {
        Inspection::Absent => "table absent".to_string(),
        Inspection::Present(state) => format!(
            "{} columns, {} indexes, {} triggers",
            state.columns.len(),
            state.indexes.len(),
            state.triggers.len()
        ),
    }
}

fn describe_decision(diff: &MigrationDiff) -> String {
    match diff.mode {
        RunMode::Rebuild => format!(
            "rebuild: {}",
            diff.reasons
                .iter()
                .map(|r| r.to_string())
                .collect::<Vec<_>>()
                .join("; ")
        ),
        RunMode::Additive if diff.missing_columns.is_empty() => {
            "additive: no columns missing".to_string()
        }
        mode => format!(
            "{mode}: {} column(s) to add",
            diff.missing_columns.len()
        ),
    }
}

fn record_added(plan: &MigrationPlan, run: &mut MigrationRun, added: &[String]) {
    for name in added {
        run.record("add column", StepOutcome::Ok, name.clone());
    }
    run.added_columns = added
        .iter()
        .filter_map(|name| plan.find_column(name).map(|c| c.name.clone()))
        .collect();
}

fn record_created(run: &mut MigrationRun, created: &CreatedObjects) {
    for index in &created.indexes {
        run.record("create index", StepOutcome::Ok, index.clone());
    }
    for trigger in &created.triggers {
        run.record("create trigger", StepOutcome::Ok, trigger.clone());
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
