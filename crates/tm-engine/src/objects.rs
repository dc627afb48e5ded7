//! Plan-managed indexes and triggers.
//!
//! Index and trigger names live in one namespace shared with tables, so a
//! plan's names are checked against the whole store before anything is
//! created.

use crate::error::{MigrateError, MigrateResult};
use rusqlite::Connection;
use tm_core::{MigrationPlan, TableName};
use tm_db::{find_object, TableState};

/// Indexes and triggers created for a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatedObjects {
    pub indexes: Vec<String>,
    pub triggers: Vec<String>,
}

impl CreatedObjects {
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty() && self.triggers.is_empty()
    }
}

/// Fail if a plan index or trigger name is held by anything other than the
/// same kind of object on the plan's own table.
pub fn check_name_collisions(conn: &Connection, plan: &MigrationPlan) -> MigrateResult<()> {
    let names = plan
        .indexes
        .iter()
        .map(|i| (i.name.as_str(), "index"))
        .chain(plan.triggers.iter().map(|t| (t.name.as_str(), "trigger")));

    for (name, kind) in names {
        let Some(holder) = find_object(conn, name)? else {
            continue;
        };
        if holder.kind == kind && plan.table.matches(&holder.table) {
            continue;
        }
        let holder = if holder.kind == "table" || holder.kind == "view" {
            format!("{} '{}'", holder.kind, holder.name)
        } else {
            format!("{} '{}' on table '{}'", holder.kind, holder.name, holder.table)
        };
        return Err(MigrateError::IndexNameCollision {
            name: name.to_string(),
            holder,
        });
    }
    Ok(())
}

/// Create the plan's indexes and triggers on `table` that `existing` does not
/// already have by name. With no existing state, creates all of them.
pub fn create_missing(
    conn: &Connection,
    plan: &MigrationPlan,
    table: &TableName,
    existing: Option<&TableState>,
) -> MigrateResult<CreatedObjects> {
    let mut created = CreatedObjects::default();

    for index in &plan.indexes {
        if existing.is_some_and(|s| s.has_index(&index.name)) {
            continue;
        }
        let sql = index.create_sql(table);
        log::debug!("{sql}");
        conn.execute_batch(&sql)?;
        created.indexes.push(index.name.to_string());
    }

    for trigger in &plan.triggers {
        if existing.is_some_and(|s| s.has_trigger(&trigger.name)) {
            continue;
        }
        let sql = trigger.create_sql(table);
        log::debug!("{sql}");
        conn.execute_batch(&sql)?;
        created.triggers.push(trigger.name.to_string());
    }
    Ok(created)
}
