//! Status command: uncommitted changes and upstream divergence per target.
use anyhow::Result;

use super::{CommandSetup, TargetResult, finish, run_target};
use crate::cli::GlobalOpts;
use crate::config::TargetConfig;
use crate::logging::Logger;
use crate::sync::git::GitSync;

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or any target's
/// git status query fails.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    execute(&setup, log)
}

/// Report status for every configured target.
///
/// # Errors
///
/// Returns an error if any target failed.
pub fn execute(setup: &CommandSetup, log: &Logger) -> Result<()> {
    let git = GitSync::new(setup.executor.clone());
    for target in &setup.config.targets {
        run_target(&target.name, log, || report(&git, target, log));
    }
    finish(log)
}

fn report(git: &GitSync, target: &TargetConfig, log: &Logger) -> Result<TargetResult> {
    let dir = target.local_path();
    log.debug(&format!("{} ({})", dir.display(), target.repo));
    if !dir.exists() {
        return Ok(TargetResult::Skipped(format!(
            "directory not found: {}",
            target.local_dir
        )));
    }
    if !dir.join(".git").exists() {
        return Ok(TargetResult::Skipped(format!(
            "not a git repository: {}",
            target.local_dir
        )));
    }

    let status = git.status(&dir, &target.sync_paths, &target.git_env)?;

    if status.modified.is_empty() {
        log.info("no uncommitted changes");
    } else {
        log.info(&format!(
            "{} uncommitted change(s):",
            status.modified.len()
        ));
        for line in &status.modified {
            log.info(&format!("  {line}"));
        }
    }
    if status.ahead > 0 {
        log.info(&format!("{} commit(s) ahead of upstream", status.ahead));
    }
    if status.behind > 0 {
        log.info(&format!("{} commit(s) behind upstream", status.behind));
    }
    if status.modified.is_empty() && status.ahead == 0 && status.behind == 0 {
        log.info("nothing to sync");
    }
    Ok(TargetResult::Ok)
}
