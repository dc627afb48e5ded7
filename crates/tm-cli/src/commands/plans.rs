//! Plans command implementation

use anyhow::Result;
use serde::Serialize;
use tm_core::PlanEntry;

use crate::cli::{GlobalArgs, OutputFormat, PlansArgs};
use crate::commands::common::{print_json, print_table};
use crate::context::ProjectContext;

#[derive(Debug, Serialize)]
struct PlanSummary {
    table: String,
    version: String,
    columns: usize,
    removed: Vec<String>,
    indexes: usize,
    triggers: usize,
    path: Option<String>,
}

impl From<&PlanEntry> for PlanSummary {
    fn from(entry: &PlanEntry) -> Self {
        let plan = &entry.plan;
        Self {
            table: plan.table.to_string(),
            version: plan.version.to_string(),
            columns: plan.columns.len(),
            removed: plan.removed_columns.iter().map(|c| c.to_string()).collect(),
            indexes: plan.indexes.len(),
            triggers: plan.triggers.len(),
            path: entry.path.as_ref().map(|p| p.display().to_string()),
        }
    }
}

/// Execute the plans command
pub async fn execute(args: &PlansArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let summaries: Vec<PlanSummary> = ctx
        .catalog
        .iter()
        .filter(|e| {
            args.table
                .as_deref()
                .map_or(true, |t| e.plan.table.matches(t))
        })
        .map(PlanSummary::from)
        .collect();

    match args.output {
        OutputFormat::Json => print_json(&summaries)?,
        OutputFormat::Table if summaries.is_empty() => println!("No plans found."),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = summaries
                .iter()
                .map(|s| {
                    vec![
                        s.table.clone(),
                        s.version.clone(),
                        s.columns.to_string(),
                        s.removed.join(", "),
                        s.indexes.to_string(),
                        s.triggers.to_string(),
                        s.path.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(
                &["TABLE", "VERSION", "COLUMNS", "REMOVED", "INDEXES", "TRIGGERS", "PATH"],
                &rows,
            );
        }
    }
    Ok(())
}
