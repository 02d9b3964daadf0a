//! Scenario runner implementation
//!
//! Runs each scenario's simulation, scans its log for the marker line,
//! and checks the extracted values against the scenario's reference.
//! Scenarios run one after another, never concurrently.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::common::config::RunnerConfig;
use crate::common::{paths, Error, Result};

use super::check::{evaluate_log, Criterion};
use super::config::{Scenario, Suite};
use super::launcher::{Invocation, Launcher, ProcessExit};
use super::report::{Failure, Outcome, ScenarioReport, SuiteReport};

/// Command-line overrides for a run
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub program: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub timeout_secs: Option<u64>,
    /// `Some` when the command line chose fail-fast on or off
    pub fail_fast: Option<bool>,
    pub no_echo: bool,
    pub quiet: bool,
}

/// Settings for a run, resolved from CLI, suite file, and config
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub program: PathBuf,
    pub work_dir: PathBuf,
    pub marker: String,
    pub timeout: Option<Duration>,
    /// Stop after the first failing scenario
    pub fail_fast: bool,
    /// Print the log of passing scenarios
    pub echo_log: bool,
    /// Suppress all human-readable output
    pub quiet: bool,
}

impl RunOptions {
    /// Resolve options; CLI overrides win over the suite, the suite over the config
    pub fn resolve(config: &RunnerConfig, suite: &Suite, overrides: Overrides) -> Result<Self> {
        let program = overrides
            .program
            .or_else(|| suite.command.as_ref().and_then(|c| c.program.clone()))
            .unwrap_or_else(|| config.program.clone());

        let work_dir = overrides.work_dir.unwrap_or_else(|| suite.work_dir());
        let work_dir = work_dir.canonicalize().map_err(|e| {
            Error::Config(format!(
                "Working directory '{}' is not accessible: {}",
                work_dir.display(),
                e
            ))
        })?;

        let marker = suite.marker.clone().unwrap_or_else(|| config.marker.clone());

        let timeout = overrides
            .timeout_secs
            .or(suite.timeout_secs)
            .or(config.timeout_secs)
            .map(Duration::from_secs);

        Ok(Self {
            program,
            work_dir,
            marker,
            timeout,
            fail_fast: overrides.fail_fast.unwrap_or(config.fail_fast),
            echo_log: config.echo_log && !overrides.no_echo && !overrides.quiet,
            quiet: overrides.quiet,
        })
    }
}

/// Run the selected scenarios of a suite, in order
///
/// Every scenario ends up in the report; problems with one scenario
/// never stop the others unless fail-fast is set.
pub async fn run_suite(
    launcher: &dyn Launcher,
    suite: &Suite,
    scenarios: &[&Scenario],
    options: &RunOptions,
) -> SuiteReport {
    let mut report = SuiteReport::new(&suite.name);

    if !options.quiet {
        println!(
            "\n{} {}",
            "Running Suite:".blue().bold(),
            suite.name.white().bold()
        );
        if let Some(desc) = &suite.description {
            println!("  {}", desc.dimmed());
        }
    }

    let mut halted = false;
    for scenario in scenarios {
        if halted {
            tracing::info!(scenario = %scenario.name, "Skipping after earlier failure");
            report.push(ScenarioReport::skipped(
                &scenario.name,
                paths::log_path(&options.work_dir, &scenario.name),
            ));
            continue;
        }

        let scenario_report = run_scenario(launcher, suite, scenario, options).await;
        if scenario_report.failed() && options.fail_fast {
            halted = true;
        }
        report.push(scenario_report);
    }

    report
}

/// Run one scenario: reset its log, run the simulation, check the log
pub async fn run_scenario(
    launcher: &dyn Launcher,
    suite: &Suite,
    scenario: &Scenario,
    options: &RunOptions,
) -> ScenarioReport {
    let log_path = paths::log_path(&options.work_dir, &scenario.name);

    if !options.quiet {
        println!(
            "\n{} {}",
            "Scenario:".cyan().bold(),
            scenario.name.white().bold()
        );
        if let Some(desc) = &scenario.description {
            println!("  {}", desc.dimmed());
        }
    }

    let mut failures = Vec::new();

    match paths::remove_stale_log(&log_path) {
        Ok(true) => tracing::debug!(log = %log_path.display(), "Removed stale log"),
        Ok(false) => {}
        Err(e) => {
            tracing::warn!(scenario = %scenario.name, "Cannot reset log: {}", e);
            failures.push(Failure::LogAccess {
                path: log_path.clone(),
                error: e.to_string(),
            });
            return finish_scenario(&scenario.name, log_path, Vec::new(), failures, None, options);
        }
    }

    let invocation = Invocation {
        program: options.program.clone(),
        args: suite.args_for(scenario),
        work_dir: options.work_dir.clone(),
        timeout: options.timeout,
    };
    tracing::info!(
        scenario = %scenario.name,
        command = %invocation.command_line(),
        "Running simulation"
    );

    let spinner = start_spinner(&scenario.name, options.quiet);
    let launched = launcher.launch(&invocation, &log_path).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    match launched {
        Ok(ProcessExit::Exited(0)) => {}
        Ok(ProcessExit::Exited(code)) => failures.push(Failure::ExitCode { code }),
        Ok(ProcessExit::Signaled) => failures.push(Failure::Signaled),
        Ok(ProcessExit::TimedOut) => failures.push(Failure::TimedOut {
            after_secs: options.timeout.map(|t| t.as_secs()).unwrap_or_default(),
        }),
        Err(e) => {
            tracing::warn!(scenario = %scenario.name, "Launch failed: {}", e);
            failures.push(Failure::Launch {
                error: e.to_string(),
            });
            return finish_scenario(&scenario.name, log_path, Vec::new(), failures, None, options);
        }
    }

    let marker = scenario.marker.as_deref().unwrap_or(&options.marker);
    let (values, log) = scan_log_file(&log_path, marker, scenario.criterion(), &mut failures);

    finish_scenario(&scenario.name, log_path, values, failures, log.as_deref(), options)
}

fn finish_scenario(
    name: &str,
    log_path: PathBuf,
    values: Vec<f64>,
    failures: Vec<Failure>,
    log: Option<&[u8]>,
    options: &RunOptions,
) -> ScenarioReport {
    let report = ScenarioReport {
        name: name.to_string(),
        log_path,
        values,
        outcome: Outcome::from_failures(failures),
    };
    if !options.quiet {
        print_outcome(&report, log, options.echo_log);
    }
    report
}

/// Check an existing log file without running anything
pub fn check_log(
    name: &str,
    log_path: &Path,
    marker: &str,
    criterion: Criterion,
    quiet: bool,
) -> ScenarioReport {
    let mut failures = Vec::new();
    let (values, _) = scan_log_file(log_path, marker, criterion, &mut failures);

    let report = ScenarioReport {
        name: name.to_string(),
        log_path: log_path.to_path_buf(),
        values,
        outcome: Outcome::from_failures(failures),
    };
    if !quiet {
        print_outcome(&report, None, false);
    }
    report
}

/// Read and evaluate a log, appending failures
///
/// Returns the extracted values and the raw log bytes, if the log could
/// be read.
fn scan_log_file(
    log_path: &Path,
    marker: &str,
    criterion: Criterion,
    failures: &mut Vec<Failure>,
) -> (Vec<f64>, Option<Vec<u8>>) {
    let bytes = match std::fs::read(log_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            failures.push(Failure::LogMissing {
                path: log_path.to_path_buf(),
            });
            return (Vec::new(), None);
        }
        Err(e) => {
            tracing::warn!(log = %log_path.display(), "Cannot read log: {}", e);
            failures.push(Failure::LogAccess {
                path: log_path.to_path_buf(),
                error: e.to_string(),
            });
            return (Vec::new(), None);
        }
    };

    let content = String::from_utf8_lossy(&bytes);
    let evaluation = evaluate_log(&content, marker, criterion);
    tracing::debug!(
        log = %log_path.display(),
        values = ?evaluation.values,
        failures = evaluation.failures.len(),
        "Scanned log"
    );
    failures.extend(evaluation.failures);

    (evaluation.values, Some(bytes))
}

fn print_outcome(report: &ScenarioReport, log: Option<&[u8]>, echo_log: bool) {
    for value in &report.values {
        println!("  {} {}", "value:".dimmed(), value);
    }

    match &report.outcome {
        Outcome::Failed { failures } => {
            for failure in failures {
                println!("  {} {}", "✗".red(), failure);
            }
            println!("  result is {}", report.exit_code());
            println!(
                "  {} {}",
                report.name.red().bold(),
                "test has failed".red().bold()
            );
        }
        _ => {
            if echo_log {
                if let Some(log) = log {
                    let mut stdout = std::io::stdout().lock();
                    if let Err(e) = stdout.write_all(log).and_then(|_| stdout.flush()) {
                        tracing::warn!("Failed to echo log: {}", e);
                    }
                }
            }
            println!(
                "  {} {}",
                "✓".green().bold(),
                "Scenario Passed".green().bold()
            );
        }
    }
}

fn start_spinner(name: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet || !std::io::stderr().is_terminal() {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.cyan} {msg} [{elapsed}]") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("simulating {}", name));
    spinner.enable_steady_tick(Duration::from_millis(120));
    Some(spinner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::DEFAULT_MARKER;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Writes canned output per input deck instead of running a process
    struct FakeLauncher {
        outputs: HashMap<String, (String, ProcessExit)>,
        calls: Mutex<Vec<Invocation>>,
    }

    impl FakeLauncher {
        fn new() -> Self {
            Self {
                outputs: HashMap::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with(mut self, input: &str, log: &str, exit: ProcessExit) -> Self {
            self.outputs
                .insert(input.to_string(), (log.to_string(), exit));
            self
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Launcher for FakeLauncher {
        async fn launch(&self, invocation: &Invocation, log_path: &Path) -> Result<ProcessExit> {
            self.calls.lock().unwrap().push(invocation.clone());
            let input = invocation.args.last().cloned().unwrap_or_default();
            match self.outputs.get(&input) {
                Some((log, exit)) => {
                    std::fs::write(log_path, log)?;
                    Ok(*exit)
                }
                None => Err(Error::ExecutableNotFound {
                    program: invocation.program.display().to_string(),
                    dir: invocation.work_dir.display().to_string(),
                }),
            }
        }
    }

    fn suite() -> Suite {
        let yaml = r#"
name: Schwarz_Cubes
scenarios:
  - { name: Cubes_DBC, input: dbc.yaml, reference: 0.000809523809524, tolerance: 1.0e-9 }
  - { name: Cubes_SDBC, input: sdbc.yaml, reference: 0.000809523809521, tolerance: 1.0e-9 }
"#;
        Suite::parse(yaml, Path::new(".")).unwrap()
    }

    fn options(work_dir: &Path) -> RunOptions {
        RunOptions {
            program: PathBuf::from("./AlbanyT"),
            work_dir: work_dir.to_path_buf(),
            marker: DEFAULT_MARKER.to_string(),
            timeout: None,
            fail_fast: false,
            echo_log: false,
            quiet: true,
        }
    }

    fn log_with(value: &str) -> String {
        format!("Albany starting\n{} {}\nAlbany done\n", DEFAULT_MARKER, value)
    }

    #[tokio::test]
    async fn test_matching_value_passes() {
        let dir = tempdir().unwrap();
        let suite = suite();
        let launcher =
            FakeLauncher::new().with("dbc.yaml", &log_with("0.000809523809524"), ProcessExit::Exited(0));

        let report = run_scenario(&launcher, &suite, &suite.scenarios[0], &options(dir.path()))
            .await;

        assert!(report.passed());
        assert_eq!(report.values, vec![0.000809523809524]);
        assert_eq!(report.log_path, dir.path().join("Cubes_DBC.log"));
    }

    #[tokio::test]
    async fn test_mismatch_fails() {
        let dir = tempdir().unwrap();
        let suite = suite();
        let launcher = FakeLauncher::new().with("dbc.yaml", &log_with("0.0009"), ProcessExit::Exited(0));

        let report = run_scenario(&launcher, &suite, &suite.scenarios[0], &options(dir.path()))
            .await;

        assert_eq!(report.outcome.failures().len(), 1);
        assert!(matches!(report.outcome.failures()[0], Failure::Mismatch { .. }));
    }

    #[tokio::test]
    async fn test_exit_code_and_mismatch_both_recorded() {
        let dir = tempdir().unwrap();
        let suite = suite();
        let launcher = FakeLauncher::new().with("dbc.yaml", &log_with("0.5"), ProcessExit::Exited(7));

        let report = run_scenario(&launcher, &suite, &suite.scenarios[0], &options(dir.path()))
            .await;

        let failures = report.outcome.failures();
        assert_eq!(failures[0], Failure::ExitCode { code: 7 });
        assert!(matches!(failures[1], Failure::Mismatch { .. }));
    }

    #[tokio::test]
    async fn test_stale_log_removed_before_launch() {
        let dir = tempdir().unwrap();
        let suite = suite();
        let log_path = dir.path().join("Cubes_DBC.log");
        std::fs::write(&log_path, log_with("0.000809523809524")).unwrap();

        // Launcher that fails to start leaves no fresh log behind
        let launcher = FakeLauncher::new();
        let report = run_scenario(&launcher, &suite, &suite.scenarios[0], &options(dir.path()))
            .await;

        assert!(!log_path.exists());
        assert!(matches!(report.outcome.failures()[0], Failure::Launch { .. }));
    }

    #[tokio::test]
    async fn test_runs_all_and_reports_all() {
        let dir = tempdir().unwrap();
        let suite = suite();
        let launcher = FakeLauncher::new()
            .with("dbc.yaml", &log_with("0.0009"), ProcessExit::Exited(0))
            .with("sdbc.yaml", "no marker here\n", ProcessExit::Exited(0));

        let selected = suite.select(&[]).unwrap();
        let report = run_suite(&launcher, &suite, &selected, &options(dir.path())).await;

        assert_eq!(launcher.call_count(), 2);
        assert_eq!(report.failed(), 2);
        assert!(matches!(
            report.scenarios[1].outcome.failures()[0],
            Failure::MarkerMissing { .. }
        ));
        assert_eq!(report.exit_code(), 2);
    }

    #[tokio::test]
    async fn test_fail_fast_skips_remaining() {
        let dir = tempdir().unwrap();
        let suite = suite();
        let launcher = FakeLauncher::new()
            .with("dbc.yaml", &log_with("0.0009"), ProcessExit::Exited(0))
            .with("sdbc.yaml", &log_with("0.000809523809521"), ProcessExit::Exited(0));

        let mut opts = options(dir.path());
        opts.fail_fast = true;
        let selected = suite.select(&[]).unwrap();
        let report = run_suite(&launcher, &suite, &selected, &opts).await;

        assert_eq!(launcher.call_count(), 1);
        assert_eq!(report.scenarios[1].outcome, Outcome::Skipped);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_process_exit_code_propagates() {
        let dir = tempdir().unwrap();
        let suite = suite();
        let launcher = FakeLauncher::new()
            .with("dbc.yaml", &log_with("0.000809523809524"), ProcessExit::Exited(0))
            .with("sdbc.yaml", &log_with("0.000809523809521"), ProcessExit::Exited(139));

        let selected = suite.select(&[]).unwrap();
        let report = run_suite(&launcher, &suite, &selected, &options(dir.path())).await;

        assert_eq!(report.exit_code(), 139);
    }

    #[tokio::test]
    async fn test_scenario_marker_override() {
        let dir = tempdir().unwrap();
        let yaml = r#"
name: custom
scenarios:
  - { name: Custom, input: c.yaml, reference: 2.0, tolerance: 0.0, marker: "Final Mean =" }
"#;
        let suite = Suite::parse(yaml, Path::new(".")).unwrap();
        let launcher = FakeLauncher::new().with("c.yaml", "Final Mean = 2.0\n", ProcessExit::Exited(0));

        let report = run_scenario(&launcher, &suite, &suite.scenarios[0], &options(dir.path()))
            .await;
        assert!(report.passed());
    }

    #[tokio::test]
    async fn test_unresettable_log_fails_only_that_scenario() {
        let dir = tempdir().unwrap();
        let suite = suite();
        // A directory in place of the log cannot be removed as a file
        std::fs::create_dir(dir.path().join("Cubes_DBC.log")).unwrap();
        let launcher = FakeLauncher::new()
            .with("dbc.yaml", &log_with("0.000809523809524"), ProcessExit::Exited(0))
            .with("sdbc.yaml", &log_with("0.000809523809521"), ProcessExit::Exited(0));

        let selected = suite.select(&[]).unwrap();
        let report = run_suite(&launcher, &suite, &selected, &options(dir.path())).await;

        assert_eq!(launcher.call_count(), 1);
        assert!(matches!(
            report.scenarios[0].outcome.failures()[0],
            Failure::LogAccess { .. }
        ));
        assert!(report.scenarios[1].passed());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_unreadable_log_is_failure() {
        let dir = tempdir().unwrap();
        // Reading a directory fails with something other than NotFound
        let report = check_log(
            "Cubes_DBC",
            dir.path(),
            DEFAULT_MARKER,
            Criterion::new(0.000809523809524, 1.0e-9),
            true,
        );
        assert!(matches!(
            report.outcome.failures(),
            [Failure::LogAccess { .. }]
        ));
    }

    #[test]
    fn test_check_missing_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Cubes_DBC.log");
        let report = check_log(
            "Cubes_DBC",
            &path,
            DEFAULT_MARKER,
            Criterion::new(0.000809523809524, 1.0e-9),
            true,
        );
        assert_eq!(
            report.outcome.failures(),
            &[Failure::LogMissing { path }]
        );
    }

    #[test]
    fn test_resolve_precedence() {
        let dir = tempdir().unwrap();
        let mut config = RunnerConfig::default();
        config.timeout_secs = Some(10);
        config.fail_fast = true;

        let yaml = r#"
name: s
command: { program: /opt/albany/AlbanyT }
timeout_secs: 20
scenarios:
  - { name: A, input: a.yaml, reference: 1.0, tolerance: 0.1 }
"#;
        let suite = Suite::parse(yaml, dir.path()).unwrap();

        let opts = RunOptions::resolve(&config, &suite, Overrides::default()).unwrap();
        assert_eq!(opts.program, PathBuf::from("/opt/albany/AlbanyT"));
        assert_eq!(opts.timeout, Some(Duration::from_secs(20)));
        assert!(opts.fail_fast);
        assert!(opts.echo_log);
        assert_eq!(opts.marker, DEFAULT_MARKER);
        assert!(opts.work_dir.is_absolute());

        let overrides = Overrides {
            program: Some(PathBuf::from("./other")),
            timeout_secs: Some(30),
            no_echo: true,
            ..Overrides::default()
        };
        let opts = RunOptions::resolve(&config, &suite, overrides).unwrap();
        assert_eq!(opts.program, PathBuf::from("./other"));
        assert_eq!(opts.timeout, Some(Duration::from_secs(30)));
        assert!(!opts.echo_log);
        assert!(opts.fail_fast);

        let overrides = Overrides {
            fail_fast: Some(false),
            ..Overrides::default()
        };
        let opts = RunOptions::resolve(&config, &suite, overrides).unwrap();
        assert!(!opts.fail_fast);

        let overrides = Overrides {
            fail_fast: Some(true),
            ..Overrides::default()
        };
        let opts = RunOptions::resolve(&RunnerConfig::default(), &suite, overrides).unwrap();
        assert!(opts.fail_fast);
    }

    #[test]
    fn test_resolve_missing_work_dir() {
        let suite = Suite::builtin();
        let overrides = Overrides {
            work_dir: Some(PathBuf::from("/nonexistent/sim-regress/work")),
            ..Overrides::default()
        };
        let err = RunOptions::resolve(&RunnerConfig::default(), &suite, overrides).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
