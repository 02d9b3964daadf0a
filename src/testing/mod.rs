//! Regression scenario runner
//!
//! Reads scenario suites, runs the simulation once per scenario with its
//! combined output captured in `<ScenarioName>.log`, and checks the value
//! following the marker line against the scenario's reference.

pub mod check;
mod config;
pub mod extract;
pub mod launcher;
pub mod report;
mod runner;

pub use check::Criterion;
pub use config::*;
pub use launcher::{Invocation, Launcher, ProcessExit, ProcessLauncher};
pub use report::{Failure, Outcome, ScenarioReport, SuiteReport};
pub use runner::{check_log, run_scenario, run_suite, Overrides, RunOptions};
