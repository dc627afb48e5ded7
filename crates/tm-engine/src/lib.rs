//! tm-engine - Schema-evolution engine for tidemark
//!
//! Takes a [`MigrationPlan`](tm_core::MigrationPlan) and brings one live
//! table to it:
//!
//! - [`diff`] decides between bootstrap, additive, and rebuild
//! - [`additive`] adds missing columns in place
//! - [`rebuild`] copies into a shadow table and swaps it in, keeping a backup
//! - [`verify`] reports every difference between the table and the plan
//! - [`rollback`] restores a rebuild's backup
//! - [`runner`] orchestrates a run and records it through [`run_log`]

pub mod additive;
pub mod bootstrap;
pub mod confirm;
pub(crate) mod ddl;
pub mod diff;
pub mod error;
pub mod objects;
pub mod rebuild;
pub mod rollback;
pub mod run_log;
pub mod runner;
pub mod verify;

pub use additive::{apply_additive, AppliedSet};
pub use confirm::{Confirmation, Prompt};
pub use diff::{diff_plan, MigrationDiff, RebuildReason};
pub use error::{MigrateError, MigrateResult};
pub use runner::{MigrationRunner, RunOutcome, BASE_VERSION};
pub use verify::{verify, Mismatch, VerificationResult};
