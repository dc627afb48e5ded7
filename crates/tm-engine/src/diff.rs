//! Mode decision: diff a plan against the live table.
//!
//! The decision is made once per plan application. Any change the additive
//! path cannot express sends the whole table down the rebuild path.

use std::fmt;
use tm_core::{ColumnSpec, MigrationPlan, RunMode};
use tm_db::{Inspection, TableState};

/// Why a plan needs the rebuild path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildReason {
    RemovedColumnPresent(String),
    RenameSourcePresent { from: String, to: String },
    TypeChanged { column: String, live: String, planned: String },
    NullabilityChanged { column: String, nullable: bool },
    DefaultChanged { column: String, live: Option<String> },
    NotAddable(String),
    PrimaryKeyChanged { live: String, planned: String },
    Forced,
}

impl fmt::Display for RebuildReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RebuildReason::RemovedColumnPresent(c) => write!(f, "removed column '{c}' is live"),
            RebuildReason::RenameSourcePresent { from, to } => {
                write!(f, "column '{from}' is renamed to '{to}'")
            }
            RebuildReason::TypeChanged {
                column,
                live,
                planned,
            } => write!(f, "column '{column}' changes type {live} -> {planned}"),
            RebuildReason::NullabilityChanged { column, nullable } => write!(
                f,
                "column '{column}' becomes {}",
                if *nullable { "nullable" } else { "NOT NULL" }
            ),
            RebuildReason::DefaultChanged { column, live } => write!(
                f,
                "column '{column}' changes default from {}",
                live.as_deref().unwrap_or("none")
            ),
            RebuildReason::NotAddable(c) => {
                write!(f, "column '{c}' cannot be added in place")
            }
            RebuildReason::PrimaryKeyChanged { live, planned } => {
                write!(f, "primary key changes from {live} to {planned}")
            }
            RebuildReason::Forced => write!(f, "rebuild forced"),
        }
    }
}

/// What applying a plan to the live table involves.
#[derive(Debug, Clone)]
pub struct MigrationDiff {
    pub mode: RunMode,
    /// Plan columns not present live, in plan order
    pub missing_columns: Vec<ColumnSpec>,
    /// Empty unless `mode` is rebuild
    pub reasons: Vec<RebuildReason>,
    /// Live columns the plan never mentions
    pub undeclared: Vec<String>,
    /// Live table constraints a rebuild from the plan would not recreate
    pub undeclared_constraints: Vec<String>,
}

impl MigrationDiff {
    /// Whether applying the plan would change nothing about the columns.
    pub fn is_noop(&self) -> bool {
        self.mode == RunMode::Additive && self.missing_columns.is_empty()
    }
}

/// Diff `plan` against a live inspection result.
pub fn diff_plan(plan: &MigrationPlan, live: &Inspection, force_rebuild: bool) -> MigrationDiff {
    let Some(state) = live.state() else {
        return MigrationDiff {
            mode: RunMode::Bootstrap,
            missing_columns: plan.columns.clone(),
            reasons: Vec::new(),
            undeclared: Vec::new(),
            undeclared_constraints: Vec::new(),
        };
    };

    let missing_columns: Vec<ColumnSpec> = plan
        .columns
        .iter()
        .filter(|c| !state.has_column(&c.name))
        .cloned()
        .collect();
    let undeclared = state
        .columns
        .iter()
        .filter(|c| !plan.declares(&c.name))
        .map(|c| c.name.clone())
        .collect();

    let undeclared_constraints = undeclared_constraints(plan, state);

    let mut reasons = rebuild_reasons(plan, state, &missing_columns);
    if force_rebuild {
        reasons.push(RebuildReason::Forced);
    }
    let mode = if reasons.is_empty() {
        RunMode::Additive
    } else {
        RunMode::Rebuild
    };

    MigrationDiff {
        mode,
        missing_columns,
        reasons,
        undeclared,
        undeclared_constraints,
    }
}

/// Render a key as `(a, b)`, with `AUTOINCREMENT` when set.
fn key_label<S: AsRef<str>>(columns: &[S], autoincrement: bool) -> String {
    if columns.is_empty() {
        return "none".to_string();
    }
    let names = columns.iter().map(|c| c.as_ref()).collect::<Vec<_>>().join(", ");
    if autoincrement {
        format!("({names}) AUTOINCREMENT")
    } else {
        format!("({names})")
    }
}

/// Same column names in any order, compared the way the store compares them.
pub(crate) fn same_columns<A: AsRef<str>, B: AsRef<str>>(left: &[A], right: &[B]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .all(|l| right.iter().any(|r| r.as_ref().eq_ignore_ascii_case(l.as_ref())))
}

fn undeclared_constraints(plan: &MigrationPlan, state: &TableState) -> Vec<String> {
    let mut constraints = Vec::new();

    let live_key = state.primary_key();
    if plan.primary_key().is_empty() && !live_key.is_empty() {
        constraints.push(format!(
            "PRIMARY KEY {}",
            key_label(&live_key, state.has_autoincrement())
        ));
    }

    for unique in state.unique_constraints() {
        let covered = plan.indexes.iter().any(|index| {
            let keys = index
                .columns
                .iter()
                .filter(|k| k.expression.is_none())
                .map(|k| k.column.as_str())
                .collect::<Vec<_>>();
            index.unique
                && keys.len() == index.columns.len()
                && same_columns(&keys, &unique.columns)
        });
        if !covered {
            constraints.push(format!("UNIQUE ({})", unique.columns.join(", ")));
        }
    }

    constraints.extend(state.definition_clauses().into_iter().map(str::to_string));
    constraints.extend(
        state
            .generated_columns
            .iter()
            .map(|c| format!("generated column '{c}'")),
    );
    constraints
}

fn rebuild_reasons(
    plan: &MigrationPlan,
    state: &TableState,
    missing: &[ColumnSpec],
) -> Vec<RebuildReason> {
    let mut reasons = Vec::new();

    for removed in &plan.removed_columns {
        if state.has_column(removed) {
            reasons.push(RebuildReason::RemovedColumnPresent(removed.to_string()));
        }
    }

    for spec in &plan.columns {
        if let Some(source) = &spec.renamed_from {
            if state.has_column(source) {
                reasons.push(RebuildReason::RenameSourcePresent {
                    from: source.to_string(),
                    to: spec.name.to_string(),
                });
            }
        }

        let Some(live) = state.column(&spec.name) else {
            continue;
        };
        if !spec.column_type.matches_declared(&live.declared_type) {
            reasons.push(RebuildReason::TypeChanged {
                column: spec.name.to_string(),
                live: live.declared_type.clone(),
                planned: spec.column_type.sql(),
            });
        }
        if live.nullable != spec.nullable {
            reasons.push(RebuildReason::NullabilityChanged {
                column: spec.name.to_string(),
                nullable: spec.nullable,
            });
        }
        if !spec.default_matches(live.default.as_deref()) {
            reasons.push(RebuildReason::DefaultChanged {
                column: spec.name.to_string(),
                live: live.default.clone(),
            });
        }
    }

    for spec in missing {
        if !spec.can_add_natively() {
            reasons.push(RebuildReason::NotAddable(spec.name.to_string()));
        }
    }

    let planned_key = plan.primary_key();
    if !planned_key.is_empty() {
        let live_key = state.primary_key();
        let live_autoincrement = state.has_autoincrement();
        if !same_columns(&planned_key, &live_key) || plan.autoincrement() != live_autoincrement {
            reasons.push(RebuildReason::PrimaryKeyChanged {
                live: key_label(&live_key, live_autoincrement),
                planned: key_label(&planned_key, plan.autoincrement()),
            });
        }
    }
    reasons
}

#[cfg(test)]
#[path = "diff_test.rs"]
mod tests;
