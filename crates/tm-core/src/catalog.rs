//! Plan discovery and lookup.
//!
//! Plans live as YAML files (one plan per file) under the project's
//! `plan_paths`, discovered recursively.

use crate::error::{CoreError, CoreResult};
use crate::plan::MigrationPlan;
use crate::version::PlanVersion;
use std::path::{Path, PathBuf};

/// A plan together with the file it was loaded from.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub plan: MigrationPlan,
    pub path: Option<PathBuf>,
}

/// All known plans, ordered by table then version.
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    entries: Vec<PlanEntry>,
}

impl PlanCatalog {
    /// Build a catalog from in-memory plans, validating each one.
    pub fn from_plans(plans: Vec<MigrationPlan>) -> CoreResult<Self> {
        Self::from_entries(
            plans
                .into_iter()
                .map(|plan| PlanEntry { plan, path: None })
                .collect(),
        )
    }

    /// Discover and load every plan file under `dirs`.
    pub fn load(dirs: &[PathBuf]) -> CoreResult<Self> {
        let mut entries = Vec::new();
        for dir in dirs {
            if !dir.is_dir() {
                return Err(CoreError::PlanDirNotFound {
                    path: dir.display().to_string(),
                });
            }
            discover_plans_recursive(dir, &mut entries)?;
        }
        log::debug!("Loaded {} plan files", entries.len());
        Self::from_entries(entries)
    }

    fn from_entries(mut entries: Vec<PlanEntry>) -> CoreResult<Self> {
        for entry in &entries {
            entry.plan.validate()?;
        }
        entries.sort_by(|a, b| {
            a.plan
                .table
                .to_ascii_lowercase()
                .cmp(&b.plan.table.to_ascii_lowercase())
                .then_with(|| a.plan.version.cmp(&b.plan.version))
        });
        for pair in entries.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if a.plan.table.matches(&b.plan.table) && a.plan.version == b.plan.version {
                return Err(CoreError::DuplicatePlan {
                    table: a.plan.table.to_string(),
                    version: a.plan.version.to_string(),
                    path1: display_path(&a.path),
                    path2: display_path(&b.path),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Number of plans.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no plans.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate plans in table/version order.
    pub fn iter(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter()
    }

    /// Plans at `version`, optionally restricted to one table.
    pub fn at_version(&self, version: &PlanVersion, table: Option<&str>) -> Vec<&MigrationPlan> {
        self.entries
            .iter()
            .map(|e| &e.plan)
            .filter(|p| &p.version == version)
            .filter(|p| table.map_or(true, |t| p.table.matches(t)))
            .collect()
    }

    /// Plans for `table`, oldest first.
    pub fn for_table(&self, table: &str) -> Vec<&MigrationPlan> {
        self.entries
            .iter()
            .map(|e| &e.plan)
            .filter(|p| p.table.matches(table))
            .collect()
    }

    /// The newest plan for `table` older than `version`.
    pub fn predecessor(&self, table: &str, version: &PlanVersion) -> Option<&MigrationPlan> {
        self.for_table(table)
            .into_iter()
            .rev()
            .find(|p| &p.version < version)
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<memory>".to_string())
}

/// Load one plan file.
pub fn load_plan_file(path: &Path) -> CoreResult<MigrationPlan> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_yaml::from_str(&content).map_err(|e| CoreError::PlanParseError {
        path: path.display().to_string(),
        details: e.to_string(),
    })
}

fn discover_plans_recursive(dir: &Path, entries: &mut Vec<PlanEntry>) -> CoreResult<()> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })? {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        paths.push(entry.path());
    }
    paths.sort();

    for path in paths {
        if path.is_dir() {
            discover_plans_recursive(&path, entries)?;
            continue;
        }
        if !path.extension().is_some_and(|e| e == "yml" || e == "yaml") {
            continue;
        }
        let plan = load_plan_file(&path)?;
        entries.push(PlanEntry {
            plan,
            path: Some(path),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
