//! Subprocess execution behind the [`Executor`] trait.
//!
//! Every external binary the engine relies on (`git`, `docker`, `ssh`,
//! `rsync`, …) is invoked through an [`Executor`], so tests can substitute a
//! recording fake without touching call sites.
use anyhow::{Context as _, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl ExecResult {
    /// An unsuccessful result for a command that never ran.
    #[must_use]
    pub fn not_run(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: reason.into(),
            success: false,
            code: None,
        }
    }

    /// The most useful diagnostic text: stderr if present, otherwise stdout.
    #[must_use]
    pub fn message(&self) -> &str {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        }
    }
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// Abstraction over process execution.
///
/// Methods only fail when the process cannot be spawned; a non-zero exit is
/// returned as data and callers decide how severe it is.
pub trait Executor: Send + Sync + std::fmt::Debug {
    /// Run a command, allowing failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command in `dir` with `env` merged onto the inherited
    /// environment for this call only, allowing failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn run_in_with_env_unchecked(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] that spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        execute(cmd, program)
    }

    fn run_in_with_env_unchecked(
        &self,
        dir: &Path,
        program: &str,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> Result<ExecResult> {
        let label = format!("{program} in {}", dir.display());
        execute(command_in(dir, program, args, env), &label)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

fn command_in(dir: &Path, program: &str, args: &[&str], env: &[(&str, &str)]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(dir);
    for (k, v) in env {
        cmd.env(k, v);
    }
    cmd
}

fn execute(mut cmd: Command, label: &str) -> Result<ExecResult> {
    tracing::debug!("exec: {label} {:?}", cmd.get_args().collect::<Vec<_>>());
    let output = cmd
        .output()
        .with_context(|| format!("failed to execute: {label}"))?;
    Ok(ExecResult::from(output))
}
