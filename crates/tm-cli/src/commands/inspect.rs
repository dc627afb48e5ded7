//! Inspect command implementation

use anyhow::{Context, Result};
use tm_core::TableName;
use tm_db::{inspect, list_tables, row_count, TableState};

use crate::cli::{GlobalArgs, InspectArgs, OutputFormat};
use crate::commands::common::{print_json, print_table, ExitCode, EXIT_USAGE};
use crate::context::ProjectContext;

/// Execute the inspect command
pub async fn execute(args: &InspectArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = ProjectContext::load(global)?;
    let table = TableName::try_new(args.table.as_str()).ok_or_else(|| {
        eprintln!("Invalid table name '{}'", args.table);
        ExitCode(EXIT_USAGE)
    })?;

    let live = inspect(ctx.store.conn(), &table)
        .with_context(|| format!("Failed to inspect table '{table}'"))?;

    if args.output == OutputFormat::Json {
        return print_json(&live);
    }
    if live.is_absent() {
        let tables = list_tables(ctx.store.conn())?;
        println!("{}", absent_message(&table, &tables));
        return Ok(());
    }
    if let Some(state) = live.state() {
        let rows = row_count(ctx.store.conn(), &state.table)?;
        print_state(state, rows);
    }
    Ok(())
}

fn absent_message(table: &TableName, tables: &[String]) -> String {
    if tables.is_empty() {
        format!("Table '{table}' does not exist. The store has no tables.")
    } else {
        format!(
            "Table '{table}' does not exist. Tables in the store: {}",
            tables.join(", ")
        )
    }
}

/// Key and definition clauses worth showing next to the column list.
fn constraint_lines(state: &TableState) -> Vec<String> {
    let mut lines = Vec::new();
    let key = state.primary_key();
    if !key.is_empty() {
        let suffix = if state.has_autoincrement() { " AUTOINCREMENT" } else { "" };
        lines.push(format!("PRIMARY KEY ({}){suffix}", key.join(", ")));
    }
    for unique in state.unique_constraints() {
        lines.push(format!("UNIQUE ({})", unique.columns.join(", ")));
    }
    lines.extend(state.definition_clauses().into_iter().map(str::to_string));
    for column in &state.generated_columns {
        lines.push(format!("GENERATED {column}"));
    }
    lines
}

fn print_state(state: &TableState, rows: u64) {
    println!("Table {} ({rows} rows)\n", state.table);

    let columns: Vec<Vec<String>> = state
        .columns
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.declared_type.clone(),
                if c.nullable { "yes" } else { "no" }.to_string(),
                c.default.clone().unwrap_or_default(),
                if c.primary_key { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(&["COLUMN", "TYPE", "NULLABLE", "DEFAULT", "PK"], &columns);

    let constraints = constraint_lines(state);
    if !constraints.is_empty() {
        println!();
        for line in constraints {
            println!("CONSTRAINT {line}");
        }
    }

    if !state.indexes.is_empty() {
        println!();
        let indexes: Vec<Vec<String>> = state
            .indexes
            .iter()
            .map(|i| {
                vec![
                    i.name.clone(),
                    i.columns.join(", "),
                    if i.unique { "yes" } else { "no" }.to_string(),
                    i.origin.clone(),
                ]
            })
            .collect();
        print_table(&["INDEX", "COLUMNS", "UNIQUE", "ORIGIN"], &indexes);
    }

    if !state.triggers.is_empty() {
        println!();
        for trigger in &state.triggers {
            println!("TRIGGER {}\n  {}", trigger.name, trigger.sql);
        }
    }
}

#[cfg(test)]
#[path = "inspect_test.rs"]
mod tests;
