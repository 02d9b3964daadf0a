//! Configuration and log file paths
//!
//! Config lives in the platform config directory:
//! - Linux: `~/.config/sim-regress/`
//! - macOS: `~/Library/Application Support/sim-regress/`
//! - Windows: `%APPDATA%\sim-regress\`
//!
//! Scenario logs are written next to the simulation inputs, one
//! `<ScenarioName>.log` per scenario.

use std::io;
use std::path::{Path, PathBuf};

/// Application name used for platform directories
const APP_NAME: &str = "sim-regress";

/// Extension for scenario log files
const LOG_EXTENSION: &str = "log";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Path of the log file for a scenario inside `work_dir`
pub fn log_path(work_dir: &Path, scenario: &str) -> PathBuf {
    work_dir.join(format!("{}.{}", scenario, LOG_EXTENSION))
}

/// Remove a stale log file if one exists
///
/// Returns whether a file was removed.
pub fn remove_stale_log(path: &Path) -> io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
