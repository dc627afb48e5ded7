//! Runtime context for CLI commands

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tm_core::{Config, ConfirmationMode, PlanCatalog, PlanVersion};
use tm_db::Store;
use tm_engine::Confirmation;

use crate::cli::GlobalArgs;
use crate::commands::common::ExitCode;

/// Loaded configuration, plan catalog, and open store
pub(crate) struct ProjectContext {
    pub config: Config,
    pub catalog: PlanCatalog,
    pub store: Store,
}

impl ProjectContext {
    /// Load the project named by the global arguments.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let root = Path::new(&global.project_dir);

        let config = match &global.config {
            Some(path) => {
                Config::load(Path::new(path)).context("Failed to load configuration file")?
            }
            None => Config::load_from_dir(root).context("Failed to load project configuration")?,
        };

        let catalog = PlanCatalog::load(&config.plan_dirs(root)).context("Failed to load plans")?;
        log::debug!("Loaded {} plan(s)", catalog.len());

        let db_path = match &global.database {
            Some(path) => PathBuf::from(path),
            None => config.database_path(root),
        };
        let store = Store::open(&db_path, Duration::from_millis(config.database.busy_timeout_ms))
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        Ok(Self {
            config,
            catalog,
            store,
        })
    }

    /// How destructive steps obtain consent; `--yes` wins over the config.
    pub fn confirmation(&self, yes: bool) -> Confirmation {
        if yes || self.config.confirmation == ConfirmationMode::Auto {
            Confirmation::AutoConfirm
        } else {
            Confirmation::interactive(ask_on_terminal)
        }
    }
}

/// Parse a `--plan` value, reporting a bad tag as a usage error.
pub(crate) fn parse_version(tag: &str) -> Result<PlanVersion> {
    tag.parse::<PlanVersion>().map_err(|e| {
        eprintln!("{e}");
        ExitCode(1).into()
    })
}

/// Ask on stderr and read the answer from stdin. Anything but `y`/`yes` declines.
fn ask_on_terminal(question: &str) -> bool {
    eprint!("{question} [y/N] ");
    let _ = std::io::stderr().flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    is_yes(&answer)
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
