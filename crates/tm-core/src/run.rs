//! Migration run records.
//!
//! A [`MigrationRun`] is created when a plan application starts, appended to
//! at every step, and persisted whether it succeeds or fails, so an operator
//! can read what was attempted without re-deriving state from the database.

use crate::error::{CoreError, CoreResult};
use crate::names::{ColumnName, TableName};
use crate::version::PlanVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// How a run changes the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Columns added in place
    Additive,
    /// Shadow table, copy, and swap
    Rebuild,
    /// Table created from scratch
    Bootstrap,
    /// Backup restored over the live table
    Rollback,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Additive => write!(f, "additive"),
            RunMode::Rebuild => write!(f, "rebuild"),
            RunMode::Bootstrap => write!(f, "bootstrap"),
            RunMode::Rollback => write!(f, "rollback"),
        }
    }
}

/// Final (or pending) status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Started, not finalized
    Pending,
    Succeeded,
    Failed,
    /// Some columns were added before one failed
    PartiallyFailed,
    /// A later rollback restored this run's backup
    RolledBack,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::PartiallyFailed => write!(f, "partially_failed"),
            RunStatus::RolledBack => write!(f, "rolled_back"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RunStatus::Pending),
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            "partially_failed" => Ok(RunStatus::PartiallyFailed),
            "rolled_back" => Ok(RunStatus::RolledBack),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Position of a run in the runner's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    NotStarted,
    Inspecting,
    Additive,
    Rebuild,
    Bootstrap,
    RollingBack,
    Verifying,
    Succeeded,
    Failed,
}

impl RunPhase {
    /// Whether the state machine allows moving from `self` to `next`.
    ///
    /// Every path to `Succeeded` passes through `Verifying`; any
    /// non-terminal phase may fail.
    pub fn can_advance_to(self, next: RunPhase) -> bool {
        use RunPhase::*;
        match (self, next) {
            (NotStarted, Inspecting) => true,
            (Inspecting, Additive | Rebuild | Bootstrap | RollingBack) => true,
            (Additive | Rebuild | Bootstrap | RollingBack, Verifying) => true,
            (Verifying, Succeeded) => true,
            (Succeeded | Failed, _) => false,
            (_, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::NotStarted => "not_started",
            RunPhase::Inspecting => "inspecting",
            RunPhase::Additive => "additive",
            RunPhase::Rebuild => "rebuild",
            RunPhase::Bootstrap => "bootstrap",
            RunPhase::RollingBack => "rolling_back",
            RunPhase::Verifying => "verifying",
            RunPhase::Succeeded => "succeeded",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Outcome of one recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Ok,
    Skipped,
    Failed,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Ok => write!(f, "ok"),
            StepOutcome::Skipped => write!(f, "skipped"),
            StepOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// One entry of a run's step-by-step account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub at: DateTime<Utc>,
    pub phase: RunPhase,
    pub step: String,
    pub outcome: StepOutcome,
    pub message: String,
}

/// Record of one plan application against one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationRun {
    /// Short unique identifier
    pub run_id: String,

    /// Version of the plan being applied
    pub plan_version: PlanVersion,

    /// Target table
    pub table: TableName,

    /// Checksum of the plan when the run started
    pub plan_checksum: String,

    /// Version the table was at before this run, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_version: Option<String>,

    pub started_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// Chosen after inspection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RunMode>,

    pub status: RunStatus,

    pub phase: RunPhase,

    /// Set only for rebuild (and rollback) runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_table: Option<TableName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count_before: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count_after: Option<u64>,

    /// Columns added by the additive path, in order
    #[serde(default)]
    pub added_columns: Vec<ColumnName>,

    /// DDL of indexes and triggers dropped from the original table during a
    /// rebuild, replayed by rollback
    #[serde(default)]
    pub captured_objects: Vec<String>,

    /// Step-by-step account
    #[serde(default)]
    pub steps: Vec<StepRecord>,

    /// Final error message for failed runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MigrationRun {
    /// Create a pending run.
    pub fn new(table: TableName, plan_version: PlanVersion, plan_checksum: String) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string()[..8].to_string(),
            plan_version,
            table,
            plan_checksum,
            from_version: None,
            started_at: Utc::now(),
            finished_at: None,
            mode: None,
            status: RunStatus::Pending,
            phase: RunPhase::NotStarted,
            backup_table: None,
            row_count_before: None,
            row_count_after: None,
            added_columns: Vec::new(),
            captured_objects: Vec::new(),
            steps: Vec::new(),
            error: None,
        }
    }

    /// Move to `next`, recording the transition.
    pub fn advance(&mut self, next: RunPhase) -> CoreResult<()> {
        if !self.phase.can_advance_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.phase.to_string(),
                to: next.to_string(),
            });
        }
        log::debug!("run {}: {} -> {}", self.run_id, self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Append a step to the account.
    pub fn record(&mut self, step: &str, outcome: StepOutcome, message: impl Into<String>) {
        let message = message.into();
        log::debug!("run {} [{}] {} {}: {}", self.run_id, self.phase, step, outcome, message);
        self.steps.push(StepRecord {
            at: Utc::now(),
            phase: self.phase,
            step: step.to_string(),
            outcome,
            message,
        });
    }

    /// Finalize as succeeded. Only reachable from `Verifying`.
    pub fn succeed(&mut self) -> CoreResult<()> {
        self.advance(RunPhase::Succeeded)?;
        self.status = RunStatus::Succeeded;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    /// Finalize as failed with `status` (failed or partially failed).
    pub fn fail(&mut self, status: RunStatus, error: impl Into<String>) {
        let error = error.into();
        if self.phase.can_advance_to(RunPhase::Failed) {
            self.phase = RunPhase::Failed;
        }
        self.record("finalize", StepOutcome::Failed, error.clone());
        self.status = status;
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
    }

    /// Human-readable account, one line per step.
    pub fn log(&self) -> Vec<String> {
        self.steps
            .iter()
            .map(|s| {
                format!(
                    "{} [{}] {} {}: {}",
                    s.at.format("%H:%M:%S%.3f"),
                    s.phase,
                    s.step,
                    s.outcome,
                    s.message
                )
            })
            .collect()
    }

    /// Whether the run finished successfully.
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }
}

#[cfg(test)]
#[path = "run_test.rs"]
mod tests;
