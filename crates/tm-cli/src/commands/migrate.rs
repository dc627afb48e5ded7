//! Migrate command implementation
//!
//! Applies every plan of one version, or rolls back the rebuilds that
//! version made, and reports each run as it finishes.

use anyhow::{Context, Result};
use tm_engine::{MigrateError, MigrationRunner, RunOutcome};

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{exit_code_for, ExitCode, EXIT_USAGE};
use crate::context::{parse_version, ProjectContext};

/// Execute the migrate command
pub async fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let version = parse_version(&args.plan)?;
    let table = args.table.as_deref();

    let mut runner = MigrationRunner::new(&ctx.store, ctx.confirmation(args.yes))
        .context("Failed to prepare the run log")?
        .with_catalog(&ctx.catalog)
        .force_rebuild(args.force_rebuild);

    let result = if args.rollback {
        runner.rollback_version(&version, table)
    } else {
        runner.apply_version(&version, table)
    };
    let outcomes = match result {
        Ok(outcomes) => outcomes,
        Err(err @ MigrateError::PlanNotFound { .. }) => {
            eprintln!("{err}");
            return Err(ExitCode(EXIT_USAGE).into());
        }
        Err(err) => return Err(err).context("Failed to record the migration run"),
    };

    let action = if args.rollback { "Rolling back" } else { "Applying" };
    println!("{action} {} plan(s) at {version}\n", outcomes.len());
    for outcome in &outcomes {
        print_outcome(outcome, global.verbose);
    }

    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    println!(
        "\nCompleted: {} succeeded, {} failed",
        outcomes.len() - failed,
        failed
    );

    match outcomes
        .iter()
        .filter_map(|o| o.error.as_ref())
        .map(exit_code_for)
        .max()
    {
        Some(code) => Err(ExitCode(code).into()),
        None => Ok(()),
    }
}

fn print_outcome(outcome: &RunOutcome, verbose: bool) {
    let run = &outcome.run;
    let mode = run.mode.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string());

    match &outcome.error {
        None => {
            let mut detail = Vec::new();
            if !run.added_columns.is_empty() {
                let names: Vec<&str> = run.added_columns.iter().map(|c| c.as_str()).collect();
                detail.push(format!("added {}", names.join(", ")));
            }
            if let Some(backup) = &run.backup_table {
                detail.push(format!("backup {backup}"));
            }
            if let Some(rows) = run.row_count_after {
                detail.push(format!("{rows} rows"));
            }
            let detail = if detail.is_empty() {
                String::new()
            } else {
                format!(" - {}", detail.join(", "))
            };
            println!("  \u{2713} {} ({mode}){detail} [run {}]", run.table, run.run_id);
        }
        Some(err) => {
            println!("  \u{2717} {} ({mode}) - {err} [run {}]", run.table, run.run_id);
        }
    }

    if verbose || outcome.error.is_some() {
        for line in run.log() {
            println!("      {line}");
        }
    }
}
