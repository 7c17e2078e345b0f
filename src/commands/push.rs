//! Push command: stage, commit and push each target's sync paths.
use anyhow::Result;

use super::{CommandSetup, TargetResult, finish, run_target};
use crate::cli::{GlobalOpts, PushOpts};
use crate::config::TargetConfig;
use crate::logging::Logger;
use crate::sync::git::{CommitRef, GitSync};

/// Run the push command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, `--target` names
/// an unknown target, or any target fails to push.
pub fn run(global: &GlobalOpts, opts: &PushOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    execute(&setup, opts, global.dry_run, log)
}

/// Push the selected targets.
///
/// # Errors
///
/// Returns an error if `opts.target` is unknown or any target failed.
pub fn execute(setup: &CommandSetup, opts: &PushOpts, dry_run: bool, log: &Logger) -> Result<()> {
    let git = GitSync::new(setup.executor.clone());
    for target in setup.config.select_targets(opts.target.as_deref())? {
        run_target(&target.name, log, || {
            push_target(&git, target, &opts.message, dry_run, log)
        });
    }
    finish(log)
}

fn push_target(
    git: &GitSync,
    target: &TargetConfig,
    message: &str,
    dry_run: bool,
    log: &Logger,
) -> Result<TargetResult> {
    let dir = target.local_path();
    if !dir.exists() {
        return Ok(TargetResult::Skipped(format!(
            "directory not found: {}",
            target.local_dir
        )));
    }

    let outcome = git.push(&dir, &target.sync_paths, message, &target.git_env, dry_run)?;
    for file in &outcome.files_staged {
        log.info(&format!("staged: {file}"));
    }

    match outcome.commit {
        None => {
            log.info("nothing to commit");
            Ok(TargetResult::Ok)
        }
        Some(CommitRef::DryRun) => {
            log.dry_run(&format!(
                "would commit and push {} file(s): \"{message}\"",
                outcome.files_staged.len()
            ));
            Ok(TargetResult::DryRun)
        }
        Some(CommitRef::Id(id)) => {
            log.info(&format!("pushed {id}: \"{message}\""));
            Ok(TargetResult::Ok)
        }
    }
}
