//! Simulation process launching
//!
//! The runner talks to a [`Launcher`] so tests can stand in for the
//! real simulation executable.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::common::{Error, Result};

/// A fully resolved simulation command
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
    /// Kill the process after this long
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Command line as a display string
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// How the simulation process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// Exited normally with a code
    Exited(i32),
    /// Terminated without an exit code
    Signaled,
    /// Killed after the timeout elapsed
    TimedOut,
}

/// Runs a simulation with its combined output written to a log file
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Run `invocation` to completion, writing stdout and stderr to `log_path`
    async fn launch(&self, invocation: &Invocation, log_path: &Path) -> Result<ProcessExit>;
}

/// Launches the simulation as a child process
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn launch(&self, invocation: &Invocation, log_path: &Path) -> Result<ProcessExit> {
        let log = File::create(log_path).map_err(|e| Error::file_write(log_path, e))?;
        let log_err = log.try_clone()?;

        let program = resolve_program(&invocation.program, &invocation.work_dir)?;

        let mut child = Command::new(&program)
            .args(&invocation.args)
            .current_dir(&invocation.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::LaunchFailed {
                program: program.display().to_string(),
                error: e.to_string(),
            })?;

        tracing::debug!(
            pid = child.id(),
            program = %program.display(),
            "Simulation started"
        );

        let status = match invocation.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    tracing::warn!(
                        timeout_secs = limit.as_secs(),
                        "Simulation timed out, killing it"
                    );
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill simulation: {}", e);
                    }
                    return Ok(ProcessExit::TimedOut);
                }
            },
            None => child.wait().await?,
        };

        tracing::debug!(?status, "Simulation finished");

        Ok(match status.code() {
            Some(code) => ProcessExit::Exited(code),
            None => ProcessExit::Signaled,
        })
    }
}

/// Resolve the executable the way a shell would from `work_dir`
///
/// Paths with a directory component are taken relative to `work_dir`;
/// bare names are searched on `PATH`.
pub fn resolve_program(program: &Path, work_dir: &Path) -> Result<PathBuf> {
    which::which_in(program, std::env::var_os("PATH"), work_dir).map_err(|_| {
        Error::ExecutableNotFound {
            program: program.display().to_string(),
            dir: work_dir.display().to_string(),
        }
    })
}
