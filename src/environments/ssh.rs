//! A remote host reached over SSH as an environment.
//!
//! Commands run through the remote login shell, so every segment is quoted
//! before it is handed to `ssh`. Transfers use `rsync` over `ssh`.
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use super::{Environment, EnvironmentKind, remote, remote_path};
use crate::config::SyncPath;
use crate::config::validation::validate_host;
use crate::error::{EnvironmentError, ValidationError};
use crate::exec::{ExecResult, Executor};

/// Seconds the availability check waits for a connection.
const CONNECT_TIMEOUT_SECS: u32 = 5;

/// Deploys to a directory on an SSH host.
#[derive(Debug)]
pub struct SshEnvironment {
    host: String,
    executor: Arc<dyn Executor>,
}

impl SshEnvironment {
    /// Create an adapter for `host` (anything `ssh` accepts, e.g. `me@box`).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Host`] if `host` is empty, starts with `-`,
    /// or contains a NUL byte.
    pub fn new(host: &str, executor: Arc<dyn Executor>) -> Result<Self, ValidationError> {
        validate_host(host)?;
        Ok(Self {
            host: host.to_string(),
            executor,
        })
    }

    /// Replace a leading `~` in `dir` with the remote home directory, as
    /// the remote shell will when `find` runs.
    fn expand_home(&self, dir: &str) -> String {
        let rest = match dir.strip_prefix('~') {
            Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
            _ => return dir.to_string(),
        };
        let out = self.run(&["echo", "~"]);
        let home = out.stdout.trim();
        if !out.success || home.is_empty() {
            return dir.to_string();
        }
        format!("{home}{rest}")
    }

    fn run_checked(&self, segments: &[&str], path: &str) -> Result<(), EnvironmentError> {
        let out = self.run(segments);
        if out.success {
            Ok(())
        } else {
            Err(EnvironmentError::TransferFailed {
                path: path.to_string(),
                message: out.message().to_string(),
            })
        }
    }

    fn rsync(&self, args: &[&str], sync_path: &SyncPath) -> Result<(), EnvironmentError> {
        let out = self
            .executor
            .run_unchecked("rsync", args)
            .unwrap_or_else(|e| ExecResult::not_run(format!("{e:#}")));
        if out.success {
            Ok(())
        } else {
            Err(EnvironmentError::TransferFailed {
                path: sync_path.to_string(),
                message: out.message().to_string(),
            })
        }
    }
}

impl Environment for SshEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Ssh
    }

    fn display_name(&self) -> String {
        format!("ssh {}", self.host)
    }

    fn is_available(&self) -> bool {
        if !self.executor.which("ssh") {
            tracing::debug!("ssh not found on PATH");
            return false;
        }
        let timeout = format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}");
        self.executor
            .run_unchecked(
                "ssh",
                &["-o", &timeout, "-o", "BatchMode=yes", &self.host, "true"],
            )
            .is_ok_and(|out| out.success)
    }

    fn run(&self, segments: &[&str]) -> ExecResult {
        let quoted: Vec<String> = segments.iter().map(|s| quote_remote(s)).collect();
        let mut args = vec![self.host.as_str()];
        args.extend(quoted.iter().map(String::as_str));
        self.executor
            .run_unchecked("ssh", &args)
            .unwrap_or_else(|e| ExecResult::not_run(format!("{e:#}")))
    }

    fn read_file(&self, path: &str) -> Option<String> {
        remote::read_file(self, path)
    }

    fn list_files(&self, dir: &str) -> Vec<String> {
        let prefix = self.expand_home(dir);
        remote::list_files(self, dir, &prefix)
    }

    fn deploy(
        &self,
        staging: &Path,
        target_dir: &str,
        sync_paths: &[SyncPath],
    ) -> Result<Vec<SyncPath>> {
        self.run_checked(&["mkdir", "-p", target_dir], target_dir)?;

        let mut deployed = Vec::new();
        for sp in sync_paths {
            let src = staging.join(sp);
            let Ok(meta) = src.symlink_metadata() else {
                continue;
            };
            let dest = remote_path(target_dir, sp);
            let src = src.to_string_lossy();

            if meta.is_dir() {
                self.run_checked(&["mkdir", "-p", &dest], &dest)?;
                let from = format!("{src}/");
                let to = format!("{}:{dest}/", self.host);
                self.rsync(&["-az", "--delete", "-e", "ssh", &from, &to], sp)?;
            } else {
                if let Some(parent) = remote::parent(&dest) {
                    self.run_checked(&["mkdir", "-p", parent], parent)?;
                }
                let to = format!("{}:{dest}", self.host);
                self.rsync(&["-az", "-e", "ssh", &src, &to], sp)?;
            }
            tracing::debug!("synced {sp} to {}:{dest}", self.host);
            deployed.push(sp.clone());
        }
        Ok(deployed)
    }

    fn clean(&self, target_dir: &str, sync_paths: &[SyncPath]) {
        for sp in sync_paths {
            let out = self.run(&["rm", "-rf", &remote_path(target_dir, sp)]);
            if !out.success {
                tracing::debug!("clean {sp}: {}", out.message());
            }
        }
    }
}

/// Quote one command segment for the remote shell. A leading `~` or `~/`
/// stays bare so the remote shell still expands it.
#[must_use]
pub fn quote_remote(segment: &str) -> String {
    if segment == "~" {
        return segment.to_string();
    }
    match segment.strip_prefix("~/") {
        Some("") => "~/".to_string(),
        Some(rest) => format!("~/{}", shell_quote(rest)),
        None => shell_quote(segment),
    }
}

/// POSIX single-quote `value` unless it consists only of characters the
/// shell treats literally.
#[must_use]
pub fn shell_quote(value: &str) -> String {
    let is_plain = |c: char| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c);
    if !value.is_empty() && value.chars().all(is_plain) {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}
