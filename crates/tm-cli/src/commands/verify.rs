//! Verify command implementation
//!
//! Read-only: compares each plan of a version with its live table.

use anyhow::{Context, Result};
use serde::Serialize;
use tm_engine::{verify, Mismatch};

use crate::cli::{GlobalArgs, OutputFormat, VerifyArgs};
use crate::commands::common::{print_json, ExitCode, EXIT_MISMATCH, EXIT_USAGE};
use crate::context::{parse_version, ProjectContext};

#[derive(Debug, Serialize)]
struct TableReport {
    table: String,
    version: String,
    ok: bool,
    mismatches: Vec<Mismatch>,
}

/// Execute the verify command
pub async fn execute(args: &VerifyArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let version = parse_version(&args.plan)?;

    let plans = ctx.catalog.at_version(&version, args.table.as_deref());
    if plans.is_empty() {
        eprintln!("No plan found for version {version}");
        return Err(ExitCode(EXIT_USAGE).into());
    }

    let mut reports = Vec::with_capacity(plans.len());
    for plan in plans {
        let result = verify(ctx.store.conn(), plan, None)
            .with_context(|| format!("Failed to verify '{}'", plan.table))?;
        reports.push(TableReport {
            table: plan.table.to_string(),
            version: plan.version.to_string(),
            ok: result.ok(),
            mismatches: result.mismatches,
        });
    }

    match args.output {
        OutputFormat::Json => print_json(&reports)?,
        OutputFormat::Table => {
            for report in &reports {
                if report.ok {
                    println!("  \u{2713} {} matches {}", report.table, report.version);
                } else {
                    println!("  \u{2717} {} differs from {}", report.table, report.version);
                    for mismatch in &report.mismatches {
                        println!("      - {mismatch}");
                    }
                }
            }
        }
    }

    if reports.iter().any(|r| !r.ok) {
        return Err(ExitCode(EXIT_MISMATCH).into());
    }
    Ok(())
}
