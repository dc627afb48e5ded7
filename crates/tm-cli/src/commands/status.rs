//! Status command implementation

use anyhow::{Context, Result};
use tm_core::MigrationRun;
use tm_engine::run_log;

use crate::cli::{GlobalArgs, OutputFormat, StatusArgs};
use crate::commands::common::{format_timestamp, print_json, print_table};
use crate::context::ProjectContext;

/// Execute the status command
pub async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    run_log::ensure_run_log(ctx.store.conn()).context("Failed to prepare the run log")?;
    let runs = run_log::list_runs(ctx.store.conn(), args.table.as_deref())
        .context("Failed to read the run log")?;

    match args.output {
        OutputFormat::Json => print_json(&runs)?,
        OutputFormat::Table if runs.is_empty() => println!("No migration runs recorded."),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = runs.iter().map(run_row).collect();
            print_table(
                &[
                    "RUN", "TABLE", "VERSION", "MODE", "STATUS", "FROM", "BACKUP", "STARTED",
                ],
                &rows,
            );
            if args.steps {
                for run in &runs {
                    println!("\n{} {} {}:", run.run_id, run.table, run.plan_version);
                    for line in run.log() {
                        println!("  {line}");
                    }
                    if let Some(error) = &run.error {
                        println!("  error: {error}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn run_row(run: &MigrationRun) -> Vec<String> {
    vec![
        run.run_id.clone(),
        run.table.to_string(),
        run.plan_version.to_string(),
        run.mode.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
        run.status.to_string(),
        run.from_version.clone().unwrap_or_else(|| "-".to_string()),
        run.backup_table
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string()),
        format_timestamp(&run.started_at),
    ]
}
