//! Path-scoped git status, push and pull against a target's local directory.
//!
//! Every call runs `git` in the repository directory with the target's
//! environment overlay (proxies and the like) merged onto the inherited
//! environment for that call only.
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::config::SyncPath;
use crate::error::GitError;
use crate::exec::{ExecResult, Executor};
use crate::fs;

/// Summary returned by a pull that changed nothing.
pub const ALREADY_UP_TO_DATE: &str = "Already up to date.";

/// Local changes and divergence from upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitStatus {
    /// Porcelain status lines for the sync paths.
    pub modified: Vec<String>,
    /// Local commits not yet on the upstream.
    pub ahead: u32,
    /// Upstream commits not yet merged locally.
    pub behind: u32,
}

/// The commit a push produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitRef {
    /// Dry run: a commit would have been made.
    DryRun,
    /// Short id of the pushed commit.
    Id(String),
}

impl fmt::Display for CommitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DryRun => f.write_str("(dry-run)"),
            Self::Id(id) => f.write_str(id),
        }
    }
}

/// Result of [`GitSync::push`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    /// `None` when nothing was staged.
    pub commit: Option<CommitRef>,
    /// Staged files under the sync paths, as git lists them.
    pub files_staged: Vec<String>,
}

/// Runs git on behalf of the command layer.
#[derive(Debug, Clone)]
pub struct GitSync {
    executor: Arc<dyn Executor>,
}

impl GitSync {
    /// Create a coordinator that runs git through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Modified sync paths plus ahead/behind counts against upstream.
    ///
    /// Ahead/behind are 0/0 both when no upstream is configured and when the
    /// comparison fails.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::CommandFailed`] if `git status` fails or git cannot
    /// be spawned.
    pub fn status(
        &self,
        repo_dir: &Path,
        sync_paths: &[SyncPath],
        overlay: &BTreeMap<String, String>,
    ) -> Result<GitStatus, GitError> {
        let mut status = GitStatus::default();

        if !sync_paths.is_empty() {
            let mut args = vec!["status", "--porcelain", "--"];
            args.extend(sync_paths.iter().map(SyncPath::as_str));
            let out = self.git_checked(repo_dir, &args, overlay)?;
            status.modified = out
                .stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect();
        }

        let counts = self.git(
            repo_dir,
            &["rev-list", "--left-right", "--count", "HEAD...@{upstream}"],
            overlay,
        )?;
        if counts.success
            && let Some((ahead, behind)) = parse_counts(&counts.stdout)
        {
            status.ahead = ahead;
            status.behind = behind;
        } else {
            tracing::debug!("no upstream comparison: {}", counts.message());
        }

        Ok(status)
    }

    /// Stage the sync paths, then commit and push them.
    ///
    /// Paths that are neither on disk nor tracked are left out. Staging,
    /// the staged-file list and the commit are all limited to the remaining
    /// paths, so anything else already in the index stays out of the commit.
    /// Nothing staged is a no-op. In dry-run mode the paths are staged to
    /// find out what would be committed and immediately unstaged again.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::CommandFailed`] if any git step fails.
    pub fn push(
        &self,
        repo_dir: &Path,
        sync_paths: &[SyncPath],
        message: &str,
        overlay: &BTreeMap<String, String>,
        dry_run: bool,
    ) -> Result<PushOutcome, GitError> {
        let paths = self.known_paths(repo_dir, sync_paths, overlay)?;
        if paths.is_empty() {
            return Ok(PushOutcome::default());
        }

        let mut add = vec!["add", "--"];
        add.extend(&paths);
        self.git_checked(repo_dir, &add, overlay)?;

        let mut cached = vec!["diff", "--cached", "--name-only", "--"];
        cached.extend(&paths);
        let staged = self.git_checked(repo_dir, &cached, overlay)?;
        let files_staged: Vec<String> = staged
            .stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        if files_staged.is_empty() {
            tracing::debug!("nothing staged in {}", repo_dir.display());
            return Ok(PushOutcome::default());
        }

        if dry_run {
            self.unstage(repo_dir, &paths, overlay)?;
            return Ok(PushOutcome {
                commit: Some(CommitRef::DryRun),
                files_staged,
            });
        }

        let mut commit = vec!["commit", "-m", message, "--"];
        commit.extend(&paths);
        self.git_checked(repo_dir, &commit, overlay)?;
        let id = self.git_checked(repo_dir, &["rev-parse", "--short", "HEAD"], overlay)?;
        self.git_checked(repo_dir, &["push"], overlay)?;

        Ok(PushOutcome {
            commit: Some(CommitRef::Id(id.stdout.trim().to_string())),
            files_staged,
        })
    }

    /// Pull from the configured upstream and return git's summary.
    ///
    /// In dry-run mode only `git fetch --dry-run` runs.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::PullFailed`] carrying git's message if the pull
    /// fails, or [`GitError::CommandFailed`] if git cannot be spawned.
    pub fn pull(
        &self,
        repo_dir: &Path,
        overlay: &BTreeMap<String, String>,
        dry_run: bool,
    ) -> Result<String, GitError> {
        if dry_run {
            let fetch = self.git(repo_dir, &["fetch", "--dry-run"], overlay)?;
            return Ok(or_up_to_date(&fetch.stderr));
        }

        let out = self.git(repo_dir, &["pull"], overlay)?;
        if !out.success {
            return Err(GitError::PullFailed(out.message().to_string()));
        }
        Ok(or_up_to_date(&out.stdout))
    }

    /// Sync paths present on disk or known to git. A path that is only
    /// tracked (deleted locally) stays so the deletion gets committed.
    fn known_paths<'a>(
        &self,
        repo_dir: &Path,
        sync_paths: &'a [SyncPath],
        overlay: &BTreeMap<String, String>,
    ) -> Result<Vec<&'a str>, GitError> {
        let mut known = Vec::new();
        for sp in sync_paths {
            if fs::entry_exists(&repo_dir.join(sp)) {
                known.push(sp.as_str());
                continue;
            }
            let tracked = self.git(
                repo_dir,
                &["ls-files", "--error-unmatch", "--", sp.as_str()],
                overlay,
            )?;
            if tracked.success {
                known.push(sp.as_str());
            } else {
                tracing::debug!("not in {}, skipping: {sp}", repo_dir.display());
            }
        }
        Ok(known)
    }

    fn unstage(
        &self,
        repo_dir: &Path,
        paths: &[&str],
        overlay: &BTreeMap<String, String>,
    ) -> Result<(), GitError> {
        let mut reset = vec!["reset", "-q", "HEAD", "--"];
        reset.extend(paths);
        if self.git(repo_dir, &reset, overlay)?.success {
            return Ok(());
        }
        // No HEAD yet: drop the new entries from the index instead.
        let mut rm = vec!["rm", "-r", "-q", "--cached", "--ignore-unmatch", "--"];
        rm.extend(paths);
        self.git_checked(repo_dir, &rm, overlay).map(|_| ())
    }

    fn git(
        &self,
        repo_dir: &Path,
        args: &[&str],
        overlay: &BTreeMap<String, String>,
    ) -> Result<ExecResult, GitError> {
        let env: Vec<(&str, &str)> = overlay
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        self.executor
            .run_in_with_env_unchecked(repo_dir, "git", args, &env)
            .map_err(|e| GitError::CommandFailed {
                command: subcommand(args),
                message: format!("{e:#}"),
            })
    }

    fn git_checked(
        &self,
        repo_dir: &Path,
        args: &[&str],
        overlay: &BTreeMap<String, String>,
    ) -> Result<ExecResult, GitError> {
        let out = self.git(repo_dir, args, overlay)?;
        if out.success {
            Ok(out)
        } else {
            Err(GitError::CommandFailed {
                command: subcommand(args),
                message: out.message().to_string(),
            })
        }
    }
}

fn subcommand(args: &[&str]) -> String {
    args.first().copied().unwrap_or_default().to_string()
}

fn parse_counts(stdout: &str) -> Option<(u32, u32)> {
    let mut parts = stdout.split_whitespace();
    let ahead = parts.next()?.parse().ok()?;
    let behind = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}

fn or_up_to_date(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        ALREADY_UP_TO_DATE.to_string()
    } else {
        text.to_string()
    }
}
