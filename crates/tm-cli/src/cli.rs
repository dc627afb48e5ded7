//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// tidemark - bring SQLite tables to declared, versioned schemas
#[derive(Parser, Debug)]
#[command(name = "tidemark")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override database file path
    #[arg(short, long, global = true, env = "TIDEMARK_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply (or roll back) every plan of a version
    Migrate(MigrateArgs),

    /// List recorded migration runs
    Status(StatusArgs),

    /// Print the live structure of a table
    Inspect(InspectArgs),

    /// Compare live tables with the plans of a version without changing them
    Verify(VerifyArgs),

    /// List the plans found under the project's plan paths
    Plans(PlansArgs),
}

/// Output formats shared by the listing commands
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned text table
    Table,
    /// Pretty-printed JSON
    Json,
}

/// Arguments for the migrate command
#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Plan version to apply, e.g. v2
    #[arg(long)]
    pub plan: String,

    /// Only the plan for this table
    #[arg(short, long)]
    pub table: Option<String>,

    /// Restore the backup left by the version's rebuild instead of applying
    #[arg(long)]
    pub rollback: bool,

    /// Do not ask before rebuilding or rolling back
    #[arg(short, long)]
    pub yes: bool,

    /// Rebuild even when columns could be added in place
    #[arg(long)]
    pub force_rebuild: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only runs against this table
    #[arg(short, long)]
    pub table: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Print the step log of each run
    #[arg(long)]
    pub steps: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Table to inspect
    pub table: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the verify command
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Plan version to compare against
    #[arg(long)]
    pub plan: String,

    /// Only the plan for this table
    #[arg(short, long)]
    pub table: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

/// Arguments for the plans command
#[derive(Args, Debug)]
pub struct PlansArgs {
    /// Only plans for this table
    #[arg(short, long)]
    pub table: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
