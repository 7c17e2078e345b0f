//! Pull command: bring each target's local directory up to date.
use anyhow::Result;

use super::{CommandSetup, TargetResult, finish, run_target};
use crate::cli::{GlobalOpts, PullOpts};
use crate::config::TargetConfig;
use crate::logging::Logger;
use crate::sync::git::GitSync;

/// Run the pull command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, `--target` names
/// an unknown target, or any pull fails.
pub fn run(global: &GlobalOpts, opts: &PullOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    execute(&setup, opts, global.dry_run, log)
}

/// Pull the selected targets.
///
/// # Errors
///
/// Returns an error if `opts.target` is unknown or any target failed.
pub fn execute(setup: &CommandSetup, opts: &PullOpts, dry_run: bool, log: &Logger) -> Result<()> {
    let git = GitSync::new(setup.executor.clone());
    for target in setup.config.select_targets(opts.target.as_deref())? {
        run_target(&target.name, log, || pull_target(&git, target, dry_run, log));
    }
    finish(log)
}

fn pull_target(
    git: &GitSync,
    target: &TargetConfig,
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

    let summary = git.pull(&dir, &target.git_env, dry_run)?;
    if dry_run {
        for line in summary.lines() {
            log.dry_run(line);
        }
        return Ok(TargetResult::DryRun);
    }
    for line in summary.lines() {
        log.info(line);
    }
    Ok(TargetResult::Ok)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::{config_from, setup_with};
    use crate::exec::test_helpers::MockResponse;
    use crate::logging::{Outcome, isolated_logger};

    const CONFIG: &str = r#"
[[targets]]
name = "claude"
profile = "claude"
repo = "r"
local_dir = "{root}"
"#;

    #[test]
    fn pull_failure_carries_git_message() {
        let (log, _tmp, _guard) = isolated_logger();
        let root = tempfile::tempdir().unwrap();
        let (setup, _) = setup_with(
            config_from(CONFIG, root.path()),
            vec![MockResponse::fail("fatal: couldn't find remote ref main")],
        );

        assert!(execute(&setup, &PullOpts::default(), false, &log).is_err());
        let entry = &log.entries()[0];
        assert_eq!(entry.outcome, Outcome::Failed);
        assert_eq!(
            entry.message.as_deref(),
            Some("fatal: couldn't find remote ref main")
        );
    }

    #[test]
    fn dry_run_only_fetches() {
        let (log, _tmp, _guard) = isolated_logger();
        let root = tempfile::tempdir().unwrap();
        let (setup, mock) = setup_with(config_from(CONFIG, root.path()), vec![MockResponse::ok("")]);

        execute(&setup, &PullOpts::default(), true, &log).unwrap();

        assert_eq!(mock.lines(), vec!["git fetch --dry-run"]);
        assert_eq!(log.entries()[0].outcome, Outcome::DryRun);
    }

    #[test]
    fn successful_pull_is_ok() {
        let (log, _tmp, _guard) = isolated_logger();
        let root = tempfile::tempdir().unwrap();
        let (setup, mock) = setup_with(
            config_from(CONFIG, root.path()),
            vec![MockResponse::ok("Already up to date.\n")],
        );

        execute(&setup, &PullOpts { target: Some("claude".to_string()) }, false, &log).unwrap();

        assert_eq!(mock.lines(), vec!["git pull"]);
        assert_eq!(log.entries()[0].outcome, Outcome::Ok);
    }
}
