//! Configuration types and parsing for tidemark.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main project configuration from tidemark.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Database file settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Directories containing plan files
    #[serde(default = "default_plan_paths")]
    pub plan_paths: Vec<String>,

    /// Whether destructive steps ask before proceeding
    #[serde(default)]
    pub confirmation: ConfirmationMode,
}

/// Database file configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite file, relative to the project directory, or `:memory:`
    #[serde(default = "default_db_path")]
    pub path: String,

    /// How long to wait for another writer to release the file
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Confirmation behavior for rebuilds and rollbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationMode {
    /// Ask on the terminal (default)
    #[default]
    Interactive,
    /// Proceed without asking, for automated deploys
    Auto,
}

fn default_plan_paths() -> Vec<String> {
    vec!["plans".to_string()]
}

fn default_db_path() -> String {
    "tidemark.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for tidemark.yml or tidemark.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("tidemark.yml");
        let yaml_path = dir.join("tidemark.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }
        if self.plan_paths.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "At least one plan_paths entry must be specified".to_string(),
            });
        }
        if self.database.path.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "database.path cannot be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Plan directories resolved against the project root.
    pub fn plan_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.plan_paths.iter().map(|p| root.join(p)).collect()
    }

    /// Database location resolved against the project root.
    ///
    /// `:memory:` is passed through unchanged.
    pub fn database_path(&self, root: &Path) -> PathBuf {
        if self.database.path == ":memory:" {
            PathBuf::from(":memory:")
        } else {
            root.join(&self.database.path)
        }
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
