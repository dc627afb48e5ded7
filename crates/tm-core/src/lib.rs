//! tm-core - Core library for tidemark
//!
//! This crate provides the declarative migration plan model (columns,
//! indexes, triggers, versions), plan discovery, project configuration, run
//! records, and the SQL rendering helpers shared by the database and engine
//! crates.

pub mod catalog;
pub mod checksum;
pub mod column;
pub mod config;
pub mod error;
pub mod index;
pub mod names;
mod newtype_string;
pub mod plan;
pub mod run;
pub(crate) mod serde_helpers;
pub mod sql_utils;
pub mod trigger;
pub mod version;

pub use catalog::{PlanCatalog, PlanEntry};
pub use checksum::compute_checksum;
pub use column::{ColumnDefault, ColumnSpec, ColumnType, Literal};
pub use config::{Config, ConfirmationMode, DatabaseConfig};
pub use error::{CoreError, CoreResult};
pub use index::{IndexColumn, IndexExpression, IndexSpec};
pub use names::{ColumnName, IndexName, TableName, TriggerName};
pub use plan::MigrationPlan;
pub use run::{MigrationRun, RunMode, RunPhase, RunStatus, StepOutcome, StepRecord};
pub use trigger::{TriggerEvent, TriggerSpec};
pub use version::PlanVersion;
