//! Migration plans: the declarative end-state of one table at one version.
//!
//! A plan is authored once per schema version and never edited after it has
//! been applied anywhere; new requirements get a new version. The engine
//! diffs a plan against the live table instead of running hand-written DDL.

use crate::checksum::compute_checksum;
use crate::column::{ColumnSpec, ColumnType};
use crate::error::{CoreError, CoreResult};
use crate::index::IndexSpec;
use crate::names::{ColumnName, TableName};
use crate::trigger::TriggerSpec;
use crate::version::PlanVersion;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Desired structure of one table at one version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationPlan {
    /// Version tag, increasing across the plans of a table
    pub version: PlanVersion,

    /// Target table
    pub table: TableName,

    /// Optional human-readable note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Full ordered list of columns the table must have
    pub columns: Vec<ColumnSpec>,

    /// Indexes that must exist
    #[serde(default)]
    pub indexes: Vec<IndexSpec>,

    /// Triggers that must exist
    #[serde(default)]
    pub triggers: Vec<TriggerSpec>,

    /// Columns the table must not contain
    #[serde(default)]
    pub removed_columns: BTreeSet<ColumnName>,
}

impl MigrationPlan {
    /// Create an empty plan for `table` at `version`.
    pub fn new(table: impl Into<String>, version: &str) -> CoreResult<Self> {
        Ok(Self {
            version: version.parse()?,
            table: TableName::try_from(table.into())?,
            description: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            triggers: Vec::new(),
            removed_columns: BTreeSet::new(),
        })
    }

    /// Append a column.
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Append an index.
    pub fn index(mut self, index: IndexSpec) -> Self {
        self.indexes.push(index);
        self
    }

    /// Append a trigger.
    pub fn trigger(mut self, trigger: TriggerSpec) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Declare a column removed.
    pub fn remove(mut self, name: impl Into<String>) -> Self {
        self.removed_columns.insert(ColumnName::new(name));
        self
    }

    /// Look up a column spec by name, the way the store compares names.
    pub fn find_column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name.matches(name))
    }

    /// Whether `name` is listed in `removed_columns`.
    pub fn is_removed(&self, name: &str) -> bool {
        self.removed_columns.iter().any(|c| c.matches(name))
    }

    /// Whether some column copies its data from `name` during a rebuild.
    pub fn is_rename_source(&self, name: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.renamed_from.as_ref().is_some_and(|r| r.matches(name)))
    }

    /// Whether the plan mentions `name` at all (kept, removed, or renamed away).
    pub fn declares(&self, name: &str) -> bool {
        self.find_column(name).is_some() || self.is_removed(name) || self.is_rename_source(name)
    }

    /// Names of the primary key columns, in column order.
    pub fn primary_key(&self) -> Vec<&ColumnName> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| &c.name)
            .collect()
    }

    /// Whether the plan's key is an `AUTOINCREMENT` rowid alias.
    pub fn autoincrement(&self) -> bool {
        self.columns.iter().any(|c| c.autoincrement)
    }

    /// `CREATE TABLE` statement for the plan's columns under `name`.
    pub fn create_table_sql(&self, name: &TableName) -> String {
        let key = self.primary_key();
        let inline_key = key.len() == 1;
        let mut defs = self
            .columns
            .iter()
            .map(|c| c.table_definition_sql(inline_key))
            .collect::<Vec<_>>();
        if key.len() > 1 {
            let key_columns = key.iter().map(|c| c.quoted()).collect::<Vec<_>>();
            defs.push(format!("PRIMARY KEY ({})", key_columns.join(", ")));
        }
        format!("CREATE TABLE {} ({})", name.quoted(), defs.join(", "))
    }

    /// SHA-256 of the plan's canonical JSON form.
    ///
    /// Used to detect a plan edited after it was applied.
    pub fn checksum(&self) -> CoreResult<String> {
        let json = serde_json::to_string(self)?;
        Ok(compute_checksum(&json))
    }

    /// Check the plan's internal consistency.
    pub fn validate(&self) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::PlanInvalid {
            table: self.table.to_string(),
            version: self.version.to_string(),
            reason,
        };

        if self.columns.is_empty() {
            return Err(invalid("plan declares no columns".to_string()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.to_ascii_lowercase()) {
                return Err(invalid(format!("column '{}' is listed twice", column.name)));
            }
        }

        for removed in &self.removed_columns {
            if self.find_column(removed).is_some() {
                return Err(invalid(format!(
                    "column '{removed}' is both kept and removed"
                )));
            }
        }

        for column in &self.columns {
            if let Some(source) = &column.renamed_from {
                if self.find_column(source).is_some() {
                    return Err(invalid(format!(
                        "column '{}' is renamed from '{}', which is still a kept column",
                        column.name, source
                    )));
                }
                if self.is_removed(source) {
                    return Err(invalid(format!(
                        "column '{}' is renamed from '{}', which is also listed as removed",
                        column.name, source
                    )));
                }
            }
        }

        let key = self.primary_key();
        for column in self.columns.iter().filter(|c| c.autoincrement) {
            if key.len() != 1 {
                return Err(invalid(format!(
                    "column '{}' is AUTOINCREMENT but the primary key has {} columns",
                    column.name,
                    key.len()
                )));
            }
            if column.column_type != ColumnType::Integer {
                return Err(invalid(format!(
                    "column '{}' is AUTOINCREMENT but not INTEGER",
                    column.name
                )));
            }
        }

        let mut object_names = HashSet::new();
        for index in &self.indexes {
            if index.columns.is_empty() {
                return Err(invalid(format!("index '{}' has no columns", index.name)));
            }
            if self.table.matches(&index.name) {
                return Err(invalid(format!(
                    "index '{}' has the same name as its table",
                    index.name
                )));
            }
            if !object_names.insert(index.name.to_ascii_lowercase()) {
                return Err(invalid(format!("name '{}' is used twice", index.name)));
            }
            for key in &index.columns {
                if self.find_column(&key.column).is_none() {
                    return Err(invalid(format!(
                        "index '{}' references unknown column '{}'",
                        index.name, key.column
                    )));
                }
            }
        }

        for trigger in &self.triggers {
            if self.table.matches(&trigger.name) {
                return Err(invalid(format!(
                    "trigger '{}' has the same name as its table",
                    trigger.name
                )));
            }
            if !object_names.insert(trigger.name.to_ascii_lowercase()) {
                return Err(invalid(format!("name '{}' is used twice", trigger.name)));
            }
            trigger.validate(&self.table)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
