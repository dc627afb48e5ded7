//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tm_engine::MigrateError;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that the store is closed before the process ends.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the command has already reported the failure
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Usage, configuration, or plan error
pub(crate) const EXIT_USAGE: i32 = 1;
/// Migration failed; original intact or partially added
pub(crate) const EXIT_FAILED: i32 = 2;
/// Confirmation declined
pub(crate) const EXIT_DECLINED: i32 = 3;
/// Live table does not match its plan after a swap
pub(crate) const EXIT_MISMATCH: i32 = 4;

/// Exit code for a failed run.
pub(crate) fn exit_code_for(err: &MigrateError) -> i32 {
    match err {
        MigrateError::ConfirmationDeclined { .. } => EXIT_DECLINED,
        e if e.needs_repair() => EXIT_MISMATCH,
        MigrateError::PlanNotFound { .. } | MigrateError::Core(_) => EXIT_USAGE,
        _ => EXIT_FAILED,
    }
}

/// Print `value` as pretty JSON.
pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// UTC timestamp as shown in tables.
pub(crate) fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Calculate column widths for a table given headers and rows.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Render a left-aligned table: header, dashes, rows, two spaces apart.
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> Vec<String> {
    let widths = calculate_column_widths(headers, rows);
    let line = |cells: Vec<String>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(headers.iter().map(|h| h.to_string()).collect()));
    lines.push(line(widths.iter().map(|&w| "-".repeat(w)).collect()));
    lines.extend(rows.iter().map(|row| line(row.clone())));
    lines
}

/// Print a formatted table to stdout.
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    for line in format_table(headers, rows) {
        println!("{line}");
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
