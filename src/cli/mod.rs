//! CLI command handling
//!
//! Dispatches CLI commands to the scenario runner and formats output.
//! Every command yields the process exit code.

use std::path::Path;

use colored::Colorize;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::testing::{self, Criterion, Overrides, ProcessLauncher, RunOptions, Suite, SuiteReport};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands, config: &Config) -> Result<i32> {
    match command {
        Commands::Run {
            suite,
            scenarios,
            fail_fast,
            no_fail_fast,
            timeout,
            program,
            work_dir,
            no_echo,
            json,
        } => {
            let suite = Suite::load_or_builtin(suite.as_deref())?;
            let selected = suite.select(&scenarios)?;

            let overrides = Overrides {
                program,
                work_dir,
                timeout_secs: timeout,
                fail_fast: match (fail_fast, no_fail_fast) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                no_echo,
                quiet: json,
            };
            let options = RunOptions::resolve(&config.runner, &suite, overrides)?;
            tracing::debug!(?options, "Resolved run options");

            let report = testing::run_suite(&ProcessLauncher, &suite, &selected, &options).await;
            finish(&report, json)
        }

        Commands::Check {
            log,
            scenario,
            suite,
            reference,
            tolerance,
            marker,
            json,
        } => {
            let suite = Suite::load_or_builtin(suite.as_deref())?;
            let scenario = scenario.as_deref().map(|name| suite.scenario(name)).transpose()?;

            let criterion = match (scenario, reference, tolerance) {
                (_, Some(reference), Some(tolerance)) => Criterion::new(reference, tolerance),
                (Some(s), reference, tolerance) => Criterion::new(
                    reference.unwrap_or(s.reference),
                    tolerance.unwrap_or(s.tolerance),
                ),
                (None, _, _) => return Err(Error::MissingCriterion),
            };
            if !criterion.reference.is_finite()
                || !criterion.tolerance.is_finite()
                || criterion.tolerance < 0.0
            {
                return Err(Error::Config(
                    "reference must be finite and tolerance finite and non-negative".to_string(),
                ));
            }

            let marker = marker
                .or_else(|| scenario.and_then(|s| s.marker.clone()))
                .or_else(|| suite.marker.clone())
                .unwrap_or_else(|| config.runner.marker.clone());

            let name = match scenario {
                Some(s) => s.name.clone(),
                None => log_stem(&log),
            };

            let mut report = SuiteReport::new(&suite.name);
            report.push(testing::check_log(&name, &log, &marker, criterion, json));
            finish(&report, json)
        }

        Commands::List { suite } => {
            let suite = Suite::load_or_builtin(suite.as_deref())?;

            println!("{}", suite.name.white().bold());
            if let Some(desc) = &suite.description {
                println!("  {}", desc.dimmed());
            }
            for scenario in &suite.scenarios {
                println!(
                    "  {:<16} {:<20} {} ± {}",
                    scenario.name,
                    scenario.input.display(),
                    scenario.reference,
                    scenario.tolerance
                );
            }
            Ok(0)
        }
    }
}

/// Print the report and compute the exit code
fn finish(report: &SuiteReport, json: bool) -> Result<i32> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        report.print_summary();
    }

    let code = report.exit_code();
    if code != 0 {
        tracing::info!(exit_code = code, failures = report.failure_count(), "Suite failed");
    }
    Ok(code)
}

fn log_stem(log: &Path) -> String {
    log.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| log.display().to_string())
}
