//! Trigger specifications and owning-row validation.
//!
//! A trigger body is a single statement that touches only the table the
//! trigger belongs to. The body is parsed with `sqlparser` and every
//! relation it names is checked against the owning table.

use crate::error::{CoreError, CoreResult};
use crate::names::{TableName, TriggerName};
use crate::sql_utils::unquote_ident;
use serde::{Deserialize, Serialize};
use sqlparser::ast::visit_relations;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;
use std::collections::BTreeSet;
use std::fmt;
use std::ops::ControlFlow;

/// Row event a trigger fires after.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    AfterInsert,
    AfterUpdate,
    AfterDelete,
}

impl TriggerEvent {
    /// Event clause text in `CREATE TRIGGER`.
    pub fn sql(&self) -> &'static str {
        match self {
            TriggerEvent::AfterInsert => "AFTER INSERT",
            TriggerEvent::AfterUpdate => "AFTER UPDATE",
            TriggerEvent::AfterDelete => "AFTER DELETE",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEvent::AfterInsert => write!(f, "after_insert"),
            TriggerEvent::AfterUpdate => write!(f, "after_update"),
            TriggerEvent::AfterDelete => write!(f, "after_delete"),
        }
    }
}

/// Desired trigger on a plan's table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TriggerSpec {
    /// Trigger name, unique across the store
    pub name: TriggerName,

    /// Event the trigger fires after
    pub event: TriggerEvent,

    /// Single deterministic statement touching only the owning row
    pub body: String,
}

impl TriggerSpec {
    pub fn new(name: impl Into<String>, event: TriggerEvent, body: impl Into<String>) -> Self {
        Self {
            name: TriggerName::new(name),
            event,
            body: body.into(),
        }
    }

    /// Body without surrounding whitespace or a trailing semicolon.
    fn statement(&self) -> &str {
        self.body.trim().trim_end_matches(';').trim_end()
    }

    /// `CREATE TRIGGER` statement for this trigger on `table`.
    pub fn create_sql(&self, table: &TableName) -> String {
        format!(
            "CREATE TRIGGER {} {} ON {} FOR EACH ROW BEGIN {}; END",
            self.name.quoted(),
            self.event.sql(),
            table.quoted(),
            self.statement()
        )
    }

    /// Check the body is one data-modifying statement that references no
    /// table other than `table`.
    pub fn validate(&self, table: &TableName) -> CoreResult<()> {
        let invalid = |reason: String| CoreError::InvalidTrigger {
            trigger: self.name.to_string(),
            reason,
        };

        let statement = self.statement();
        let keyword = statement
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        if !matches!(keyword.as_str(), "UPDATE" | "INSERT" | "DELETE" | "REPLACE") {
            return Err(invalid(format!(
                "body must be a single UPDATE, INSERT or DELETE statement, found '{keyword}'"
            )));
        }

        let statements = Parser::parse_sql(&SQLiteDialect {}, statement)
            .map_err(|e| invalid(format!("body does not parse: {e}")))?;
        if statements.len() != 1 {
            return Err(invalid(format!(
                "body must be exactly one statement, found {}",
                statements.len()
            )));
        }

        let mut relations = BTreeSet::new();
        let _ = visit_relations(&statements[0], |relation| {
            let rendered = relation.to_string();
            let last = rendered.rsplit('.').next().unwrap_or(&rendered);
            relations.insert(unquote_ident(last).to_string());
            ControlFlow::<()>::Continue(())
        });

        let foreign: Vec<&String> = relations.iter().filter(|r| !table.matches(r)).collect();
        if !foreign.is_empty() {
            return Err(invalid(format!(
                "body references tables other than '{}': {}",
                table,
                foreign
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "trigger_test.rs"]
mod tests;
