//! Error taxonomy for migration runs.

use crate::verify::Mismatch;
use thiserror::Error;
use tm_core::{CoreError, RunStatus};
use tm_db::DbError;

/// Why a plan application or rollback did not succeed.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// The table does not exist (M001).
    ///
    /// The runner bootstraps an absent table instead of failing; rollback
    /// and verification report it.
    #[error("[M001] Table '{table}' does not exist")]
    TableAbsent { table: String },

    /// One column add failed; earlier adds are kept (M002).
    #[error(
        "[M002] Adding column '{column}' to '{table}' failed after {} column(s) were added: {message}",
        .applied.len()
    )]
    ColumnAddFailed {
        table: String,
        column: String,
        applied: Vec<String>,
        message: String,
    },

    /// Shadow copy lost rows; nothing was renamed (M003).
    #[error("[M003] Row count mismatch rebuilding '{table}': {before} rows before, {after} copied")]
    RowCountMismatch { table: String, before: u64, after: u64 },

    /// The backup name is already taken (M004).
    #[error("[M004] Backup table '{backup}' for '{table}' already exists; drop or rename it before retrying")]
    BackupNameCollision { table: String, backup: String },

    /// The live table does not match the plan after migrating (M005).
    #[error(
        "[M005] Verification of '{table}' failed with {} mismatch(es): {}",
        .mismatches.len(),
        .mismatches.iter().map(|m| m.to_string()).collect::<Vec<_>>().join("; ")
    )]
    VerificationMismatch {
        table: String,
        mismatches: Vec<Mismatch>,
    },

    /// Live columns the plan never mentions (M006).
    #[error(
        "[M006] Table '{table}' has columns the plan does not declare: {}",
        .columns.join(", ")
    )]
    UndeclaredColumns { table: String, columns: Vec<String> },

    /// An index or trigger name is held by another object (M007).
    #[error("[M007] Name '{name}' is already used by {holder}")]
    IndexNameCollision { name: String, holder: String },

    /// The plan was edited after it was applied (M008).
    #[error("[M008] Plan '{table}' {version} changed since it was applied (checksum {previous} -> {current})")]
    PlanChanged {
        table: String,
        version: String,
        previous: String,
        current: String,
    },

    /// No backup to roll back to (M009).
    #[error("[M009] No backup to roll back '{table}' {version}: {reason}")]
    BackupMissing {
        table: String,
        version: String,
        reason: String,
    },

    /// Live table no longer has the structure the rebuild produced (M010).
    #[error("[M010] Refusing to roll back '{table}': live structure differs from the plan ({details})")]
    RollbackStructureMismatch { table: String, details: String },

    /// The operator declined (M011).
    #[error("[M011] {action} of '{table}' was not confirmed")]
    ConfirmationDeclined { table: String, action: String },

    /// No plan at the requested version (M012).
    #[error("[M012] No plan found for version {version}{}", .table.as_ref().map(|t| format!(" and table '{t}'")).unwrap_or_default())]
    PlanNotFound {
        version: String,
        table: Option<String>,
    },

    /// A shadow table from an interrupted rebuild is in the way (M013).
    #[error("[M013] Shadow table '{shadow}' already exists; inspect and drop it before retrying")]
    ShadowTableExists { shadow: String },

    /// Run log could not be read or written (M014).
    #[error("[M014] Run log error: {0}")]
    RunLog(String),

    /// Store error (M015).
    #[error("[M015] {0}")]
    Db(#[from] DbError),

    /// Plan or model error (M016).
    #[error("[M016] {0}")]
    Core(#[from] CoreError),

    /// A rebuild would drop live constraints the plan does not declare (M017).
    #[error(
        "[M017] Rebuilding '{table}' would drop constraints the plan does not declare: {}",
        .constraints.join(", ")
    )]
    UndeclaredConstraints {
        table: String,
        constraints: Vec<String>,
    },
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;

impl From<rusqlite::Error> for MigrateError {
    fn from(err: rusqlite::Error) -> Self {
        MigrateError::Db(DbError::from(err))
    }
}

impl MigrateError {
    /// Status a run ending with this error is finalized as.
    pub fn run_status(&self) -> RunStatus {
        match self {
            MigrateError::ColumnAddFailed { applied, .. } if !applied.is_empty() => {
                RunStatus::PartiallyFailed
            }
            _ => RunStatus::Failed,
        }
    }

    /// Whether the live table may need manual repair.
    pub fn needs_repair(&self) -> bool {
        matches!(self, MigrateError::VerificationMismatch { .. })
    }
}
