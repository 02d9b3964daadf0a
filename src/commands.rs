//! CLI command definitions
//!
//! Defines the clap commands for the regression driver.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run scenarios and compare their results against the references
    Run {
        /// Path to a YAML suite file (default: built-in Schwarz cubes suite)
        #[arg(long)]
        suite: Option<PathBuf>,

        /// Only run the named scenario(s); can be specified multiple times
        #[arg(long = "scenario", short = 's')]
        scenarios: Vec<String>,

        /// Stop after the first failing scenario
        #[arg(long)]
        fail_fast: bool,

        /// Keep running after a failure, even if the config enables fail-fast
        #[arg(long, conflicts_with = "fail_fast")]
        no_fail_fast: bool,

        /// Kill a simulation that runs longer than this many seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Simulation executable (default: ./AlbanyT)
        #[arg(long)]
        program: Option<PathBuf>,

        /// Directory to run in and write logs to
        #[arg(long)]
        work_dir: Option<PathBuf>,

        /// Don't print the logs of passing scenarios
        #[arg(long)]
        no_echo: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check an existing log file without running the simulation
    Check {
        /// Log file to check
        log: PathBuf,

        /// Take reference and tolerance from this scenario
        #[arg(long, short = 's')]
        scenario: Option<String>,

        /// Suite file the scenario comes from (default: built-in suite)
        #[arg(long)]
        suite: Option<PathBuf>,

        /// Reference value
        #[arg(long, allow_hyphen_values = true)]
        reference: Option<f64>,

        /// Allowed deviation from the reference
        #[arg(long)]
        tolerance: Option<f64>,

        /// Marker text preceding the value
        #[arg(long)]
        marker: Option<String>,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the scenarios of a suite
    List {
        /// Path to a YAML suite file (default: built-in Schwarz cubes suite)
        #[arg(long)]
        suite: Option<PathBuf>,
    },
}
