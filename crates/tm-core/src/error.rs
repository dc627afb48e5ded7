//! Error types for tm-core

use thiserror::Error;

/// Core error type for tidemark
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Plan file could not be parsed
    #[error("[E004] Failed to parse plan file {path}: {details}")]
    PlanParseError { path: String, details: String },

    /// E005: Plan violates a structural rule
    #[error("[E005] Invalid plan '{table}' {version}: {reason}")]
    PlanInvalid {
        table: String,
        version: String,
        reason: String,
    },

    /// E006: Two plan files declare the same table and version
    #[error("[E006] Duplicate plan for table '{table}' version {version} in {path1} and {path2}")]
    DuplicatePlan {
        table: String,
        version: String,
        path1: String,
        path2: String,
    },

    /// E007: Version tag does not parse
    #[error("[E007] Invalid plan version '{tag}': {reason}")]
    InvalidVersion { tag: String, reason: String },

    /// E008: Identifier is empty or reserved
    #[error("[E008] Invalid identifier '{name}': {reason}")]
    InvalidIdentifier { name: String, reason: String },

    /// E009: Trigger body is not a single owning-row statement
    #[error("[E009] Invalid trigger '{trigger}': {reason}")]
    InvalidTrigger { trigger: String, reason: String },

    /// E010: Plan directory not found
    #[error("[E010] Plan directory not found: {path}")]
    PlanDirNotFound { path: String },

    /// E011: Run state machine refused a transition
    #[error("[E011] Invalid run transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// E012: Persisted run status is not recognized
    #[error("[E012] Unknown run status '{0}'")]
    UnknownStatus(String),

    /// E014: IO error
    #[error("[E014] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E016: IO error with file path context
    #[error("[E016] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E015: YAML parse error
    #[error("[E015] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
