//! Error types for the regression driver
//!
//! These are hard errors that stop the driver itself (bad suite file,
//! unreadable config). A scenario that fails its check is not an error;
//! it is recorded in the report.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the regression driver
#[derive(Error, Debug)]
pub enum Error {
    // === Suite Errors ===
    #[error("Invalid suite '{suite}': {reason}")]
    InvalidSuite { suite: String, reason: String },

    #[error("Unknown scenario '{name}'. Available: {available}")]
    UnknownScenario { name: String, available: String },

    #[error("Check needs either --scenario or both --reference and --tolerance")]
    MissingCriterion,

    // === Process Errors ===
    #[error("Executable '{program}' not found (working directory: {dir})")]
    ExecutableNotFound { program: String, dir: String },

    #[error("Failed to launch '{program}': {error}")]
    LaunchFailed { program: String, error: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    #[error("Failed to write file '{path}': {error}")]
    FileWrite { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create an invalid suite error
    pub fn invalid_suite(suite: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSuite {
            suite: suite.to_string(),
            reason: reason.into(),
        }
    }

    /// Create an unknown scenario error listing the known names
    pub fn unknown_scenario<S: AsRef<str>>(name: &str, available: &[S]) -> Self {
        Self::UnknownScenario {
            name: name.to_string(),
            available: available
                .iter()
                .map(|s| s.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// Create a file read error for `path`
    pub fn file_read(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileRead {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }

    /// Create a file write error for `path`
    pub fn file_write(path: &std::path::Path, error: impl std::fmt::Display) -> Self {
        Self::FileWrite {
            path: path.display().to_string(),
            error: error.to_string(),
        }
    }
}
