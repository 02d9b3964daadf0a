//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::paths::config_path;
use super::{Error, Result};

/// Marker text preceding the value of interest in the simulation log
pub const DEFAULT_MARKER: &str = "Main_Solve: MeanValue of final solution";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Runner defaults
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Runner defaults, overridden by suite files and CLI flags
#[derive(Debug, Deserialize)]
pub struct RunnerConfig {
    /// Simulation executable, resolved against the working directory
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Marker text to search for in the log
    #[serde(default = "default_marker")]
    pub marker: String,

    /// Kill the simulation after this many seconds (no limit when unset)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Stop after the first failing scenario
    #[serde(default)]
    pub fail_fast: bool,

    /// Print the full log of passing scenarios
    #[serde(default = "default_echo_log")]
    pub echo_log: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            marker: default_marker(),
            timeout_secs: None,
            fail_fast: false,
            echo_log: default_echo_log(),
        }
    }
}

fn default_program() -> PathBuf {
    PathBuf::from("./AlbanyT")
}

fn default_marker() -> String {
    DEFAULT_MARKER.to_string()
}

fn default_echo_log() -> bool {
    true
}

impl Config {
    /// Load configuration from `path`, or from the default config file
    ///
    /// An explicit path must exist. The default file is optional and
    /// its absence yields the default configuration.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_from(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        if config.runner.marker.trim().is_empty() {
            return Err(Error::Config("runner.marker must not be empty".to_string()));
        }
        Ok(config)
    }
}
