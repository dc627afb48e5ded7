//! Verifier: compares the live table with a plan.
//!
//! Every difference is reported as its own [`Mismatch`] so an operator can
//! see what is wrong without inspecting the store by hand.

use crate::diff::same_columns;
use crate::error::MigrateResult;
use rusqlite::Connection;
use serde::Serialize;
use std::fmt;
use tm_core::MigrationPlan;
use tm_db::{inspect, row_count, Inspection, TableState};

/// One way the live table differs from the plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    TableAbsent,
    MissingColumn { column: String },
    UnexpectedColumn { column: String },
    RemovedColumnPresent { column: String },
    PrimaryKey { expected: Vec<String>, actual: Vec<String> },
    RowCount { expected: u64, actual: u64 },
    MissingIndex { index: String },
    MissingTrigger { trigger: String },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::TableAbsent => write!(f, "table is absent"),
            Mismatch::MissingColumn { column } => write!(f, "missing column '{column}'"),
            Mismatch::UnexpectedColumn { column } => write!(f, "unexpected column '{column}'"),
            Mismatch::RemovedColumnPresent { column } => {
                write!(f, "removed column '{column}' is still present")
            }
            Mismatch::PrimaryKey { expected, actual } => write!(
                f,
                "primary key is ({}), expected ({})",
                actual.join(", "),
                expected.join(", ")
            ),
            Mismatch::RowCount { expected, actual } => {
                write!(f, "row count is {actual}, expected {expected}")
            }
            Mismatch::MissingIndex { index } => write!(f, "missing index '{index}'"),
            Mismatch::MissingTrigger { trigger } => write!(f, "missing trigger '{trigger}'"),
        }
    }
}

/// Outcome of one verification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationResult {
    pub mismatches: Vec<Mismatch>,
    /// Live state that was checked, when the table exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<TableState>,
    /// Live row count, when one was compared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<u64>,
}

impl VerificationResult {
    pub fn ok(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Verify the live table against `plan`.
///
/// `row_count_before` is compared with the live row count when given; the
/// rebuild path passes its pre-copy count, the additive path passes `None`.
pub fn verify(
    conn: &Connection,
    plan: &MigrationPlan,
    row_count_before: Option<u64>,
) -> MigrateResult<VerificationResult> {
    let state = match inspect(conn, &plan.table)? {
        Inspection::Absent => {
            return Ok(VerificationResult {
                mismatches: vec![Mismatch::TableAbsent],
                ..Default::default()
            })
        }
        Inspection::Present(state) => state,
    };

    let mut mismatches = structural_mismatches(plan, &state);
    let mut live_rows = None;
    if let Some(expected) = row_count_before {
        let actual = row_count(conn, &state.table)?;
        live_rows = Some(actual);
        if actual != expected {
            mismatches.push(Mismatch::RowCount { expected, actual });
        }
    }

    if mismatches.is_empty() {
        log::debug!("verify {}: ok", plan.table);
    } else {
        log::debug!("verify {}: {} mismatch(es)", plan.table, mismatches.len());
    }
    Ok(VerificationResult {
        mismatches,
        state: Some(state),
        row_count: live_rows,
    })
}

/// Column, index, and trigger differences between `state` and `plan`.
pub fn structural_mismatches(plan: &MigrationPlan, state: &TableState) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    for column in &plan.columns {
        if !state.has_column(&column.name) {
            mismatches.push(Mismatch::MissingColumn {
                column: column.name.to_string(),
            });
        }
    }
    for live in &state.columns {
        if plan.find_column(&live.name).is_some() {
            continue;
        }
        let column = live.name.clone();
        if plan.is_removed(&live.name) {
            mismatches.push(Mismatch::RemovedColumnPresent { column });
        } else {
            mismatches.push(Mismatch::UnexpectedColumn { column });
        }
    }

    let expected_key = plan.primary_key();
    let actual_key = state.primary_key();
    if !expected_key.is_empty() && !same_columns(&expected_key, &actual_key) {
        mismatches.push(Mismatch::PrimaryKey {
            expected: expected_key.iter().map(|c| c.to_string()).collect(),
            actual: actual_key.iter().map(|c| c.to_string()).collect(),
        });
    }

    for index in &plan.indexes {
        if !state.has_index(&index.name) {
            mismatches.push(Mismatch::MissingIndex {
                index: index.name.to_string(),
            });
        }
    }
    for trigger in &plan.triggers {
        if !state.has_trigger(&trigger.name) {
            mismatches.push(Mismatch::MissingTrigger {
                trigger: trigger.name.to_string(),
            });
        }
    }
    mismatches
}

#[cfg(test)]
#[path = "verify_test.rs"]
mod tests;
