//! Scenario and suite results
//!
//! Each scenario produces a [`ScenarioReport`]; the driver folds them
//! into a [`SuiteReport`], which also decides the process exit code.

use std::fmt;
use std::path::PathBuf;

use colored::Colorize;
use serde::Serialize;

/// Largest exit status every supported platform can carry
pub const MAX_EXIT_CODE: i32 = 255;

/// Why a scenario failed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Failure {
    /// The simulation could not be started
    Launch { error: String },
    /// The simulation exited with a nonzero code
    ExitCode { code: i32 },
    /// The simulation was terminated without an exit code
    Signaled,
    /// The simulation ran past its time limit and was killed
    TimedOut { after_secs: u64 },
    /// No log file to scan
    LogMissing { path: PathBuf },
    /// The log file could not be reset or read
    LogAccess { path: PathBuf, error: String },
    /// The log contains no marker line
    MarkerMissing { marker: String },
    /// A marker line whose value is not a number
    Unparseable { line: usize, text: String },
    /// A value outside the tolerance window
    Mismatch {
        line: usize,
        value: f64,
        reference: f64,
        tolerance: f64,
    },
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Launch { error } => write!(f, "launch failed: {}", error),
            Failure::ExitCode { code } => write!(f, "simulation exited with code {}", code),
            Failure::Signaled => write!(f, "simulation terminated by a signal"),
            Failure::TimedOut { after_secs } => {
                write!(f, "simulation killed after {}s timeout", after_secs)
            }
            Failure::LogMissing { path } => write!(f, "log file '{}' not found", path.display()),
            Failure::LogAccess { path, error } => {
                write!(f, "cannot access log file '{}': {}", path.display(), error)
            }
            Failure::MarkerMissing { marker } => {
                write!(f, "no line containing '{}' in log", marker)
            }
            Failure::Unparseable { line, text } => {
                write!(f, "line {}: cannot parse '{}' as a number", line, text)
            }
            Failure::Mismatch {
                line,
                value,
                reference,
                tolerance,
            } => write!(
                f,
                "line {}: value {} outside {} ± {} (off by {:e})",
                line,
                value,
                reference,
                tolerance,
                value - reference
            ),
        }
    }
}

/// Result of one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed { failures: Vec<Failure> },
    /// Not run because an earlier scenario failed in fail-fast mode
    Skipped,
}

impl Outcome {
    pub fn from_failures(failures: Vec<Failure>) -> Self {
        if failures.is_empty() {
            Outcome::Passed
        } else {
            Outcome::Failed { failures }
        }
    }

    pub fn failures(&self) -> &[Failure] {
        match self {
            Outcome::Failed { failures } => failures,
            _ => &[],
        }
    }
}

/// Report for one scenario
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub log_path: PathBuf,
    /// Values extracted from marker lines, in log order
    pub values: Vec<f64>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ScenarioReport {
    pub fn skipped(name: &str, log_path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            log_path,
            values: Vec::new(),
            outcome: Outcome::Skipped,
        }
    }

    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    /// Exit code this scenario alone would produce
    ///
    /// Same policy as [`SuiteReport::exit_code`].
    pub fn exit_code(&self) -> i32 {
        exit_code_for(self.outcome.failures())
    }
}

/// Report for a whole run
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub suite: String,
    pub scenarios: Vec<ScenarioReport>,
}

impl SuiteReport {
    pub fn new(suite: &str) -> Self {
        Self {
            suite: suite.to_string(),
            scenarios: Vec::new(),
        }
    }

    pub fn push(&mut self, report: ScenarioReport) {
        self.scenarios.push(report);
    }

    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.failed()).count()
    }

    pub fn skipped(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|s| s.outcome == Outcome::Skipped)
            .count()
    }

    /// Total failures across all scenarios
    pub fn failure_count(&self) -> usize {
        self.scenarios.iter().map(|s| s.outcome.failures().len()).sum()
    }

    /// Process exit code for this report
    ///
    /// Zero when nothing failed. Otherwise the first nonzero simulation
    /// exit code, or failing that the number of failures. Always within
    /// `1..=MAX_EXIT_CODE` when nonzero.
    pub fn exit_code(&self) -> i32 {
        exit_code_for(self.scenarios.iter().flat_map(|s| s.outcome.failures()))
    }

    /// Print the human-readable summary
    pub fn print_summary(&self) {
        println!("\n{} {}", "Summary:".blue().bold(), self.suite.white().bold());

        for scenario in &self.scenarios {
            match &scenario.outcome {
                Outcome::Passed => println!("  {} {}", "✓".green(), scenario.name),
                Outcome::Skipped => {
                    println!("  {} {} {}", "-".yellow(), scenario.name, "(skipped)".dimmed())
                }
                Outcome::Failed { failures } => {
                    println!("  {} {}", "✗".red(), scenario.name);
                    for failure in failures {
                        println!("      {}", failure.to_string().red());
                    }
                }
            }
        }

        let line = format!(
            "{} passed, {} failed, {} skipped",
            self.passed(),
            self.failed(),
            self.skipped()
        );
        if self.failed() == 0 {
            println!("\n{}\n", line.green().bold());
        } else {
            println!("\n{}\n", line.red().bold());
        }
    }
}

/// Zero without failures, else the first simulation exit code, else the
/// failure count
fn exit_code_for<'a>(failures: impl IntoIterator<Item = &'a Failure>) -> i32 {
    let mut count: usize = 0;
    for failure in failures {
        if let Failure::ExitCode { code } = failure {
            return clamp_exit_code(i64::from(*code));
        }
        count += 1;
    }

    if count == 0 {
        0
    } else {
        clamp_exit_code(i64::try_from(count).unwrap_or(i64::MAX))
    }
}

fn clamp_exit_code(code: i64) -> i32 {
    // Clamped into range, so the cast is lossless
    code.clamp(1, i64::from(MAX_EXIT_CODE)) as i32
}
