//! Subcommand orchestration.
//!
//! Each command loads the configuration once, then processes its targets
//! one at a time in config order. A failing target is logged and recorded;
//! the rest still run, and the command fails at the end if any target did.
pub mod diff;
pub mod install;
pub mod pull;
pub mod push;
pub mod status;

use anyhow::Result;
use std::sync::Arc;

use crate::cli::GlobalOpts;
use crate::config::{Config, EnvTargetConfig, EnvironmentConfig, TargetConfig};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::{Logger, Outcome};

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    pub config: Config,
    /// Runs `git`, `docker`, `ssh` and `rsync` for every command.
    pub executor: Arc<dyn Executor>,
}

impl CommandSetup {
    /// Load the configuration named by `--config` (or the default path).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let path = global.config.clone().unwrap_or_else(Config::default_path);
        log.debug(&format!("config: {}", path.display()));

        let config = Config::load(&path)?;
        if config.targets.is_empty() {
            log.warn(&format!("no targets configured in {}", path.display()));
        }

        Ok(Self {
            config,
            executor: Arc::new(SystemExecutor),
        })
    }
}

/// Result of processing one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResult {
    /// Work completed.
    Ok,
    /// Not attempted, with the reason.
    Skipped(String),
    /// Dry run: changes were reported, not applied.
    DryRun,
}

/// Run one unit of work under a stage header and record its outcome.
///
/// Errors are logged and recorded as failures, never propagated, so the
/// caller's loop moves on to the next target.
pub fn run_target(name: &str, log: &Logger, work: impl FnOnce() -> Result<TargetResult>) {
    log.stage(name);

    match work() {
        Ok(TargetResult::Ok) => log.record(name, Outcome::Ok, None),
        Ok(TargetResult::Skipped(reason)) => {
            log.warn(&format!("skipped: {reason}"));
            log.record(name, Outcome::Skipped, Some(&reason));
        }
        Ok(TargetResult::DryRun) => log.record(name, Outcome::DryRun, None),
        Err(e) => {
            log.error(&format!("{name}: {e:#}"));
            log.record(name, Outcome::Failed, Some(&format!("{e:#}")));
        }
    }
}

/// Print the summary and bail if any target failed.
///
/// # Errors
///
/// Returns an error if one or more targets recorded a failure.
pub fn finish(log: &Logger) -> Result<()> {
    log.print_summary();

    let count = log.failure_count();
    if count > 0 {
        anyhow::bail!("{count} target(s) failed");
    }
    Ok(())
}

/// Targets mapped by `env`, in config order, with their per-environment
/// settings. Mappings that name an unknown target are warned about and
/// skipped.
pub fn mapped_targets<'a>(
    config: &'a Config,
    env: &'a EnvironmentConfig,
    log: &Logger,
) -> Vec<(&'a TargetConfig, &'a EnvTargetConfig)> {
    for name in env.targets.keys() {
        if config.target(name).is_err() {
            log.warn(&format!(
                "environment '{}' maps unknown target '{name}', skipping",
                env.name
            ));
        }
    }

    config
        .targets
        .iter()
        .filter_map(|t| env.targets.get(&t.name).map(|m| (t, m)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod test_helpers {
    use super::CommandSetup;
    use crate::config::Config;
    use crate::exec::test_helpers::{MockExecutor, MockResponse};
    use std::path::Path;
    use std::sync::Arc;

    /// Parse `toml` as a config, replacing `{root}` with `root`.
    pub fn config_from(toml: &str, root: &Path) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml.replace("{root}", &root.to_string_lossy())).unwrap();
        Config::load(&path).unwrap()
    }

    /// A setup whose executor answers from `responses`.
    pub fn setup_with(config: Config, responses: Vec<MockResponse>) -> (CommandSetup, Arc<MockExecutor>) {
        let mock = Arc::new(MockExecutor::with_responses(responses));
        let setup = CommandSetup {
            config,
            executor: mock.clone(),
        };
        (setup, mock)
    }
}
