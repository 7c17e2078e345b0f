//! Install command: deploy each mapped target into one environment.
use anyhow::Result;

use super::{CommandSetup, TargetResult, finish, mapped_targets, run_target};
use crate::cli::{EnvOpts, GlobalOpts};
use crate::config::{EnvTargetConfig, EnvironmentConfig, TargetConfig};
use crate::environments::{self, Environment, EnvironmentKind};
use crate::error::EnvironmentError;
use crate::logging::Logger;
use crate::sync::staging;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the environment
/// is unknown or unreachable, or any target fails to deploy.
pub fn run(global: &GlobalOpts, opts: &EnvOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    execute(&setup, opts, global.dry_run, log)
}

/// Deploy every target mapped by `opts.environment`.
///
/// # Errors
///
/// Returns an error if the environment cannot be created or reached, or if
/// any target failed.
pub fn execute(setup: &CommandSetup, opts: &EnvOpts, dry_run: bool, log: &Logger) -> Result<()> {
    let env_config = setup.config.environment(&opts.environment)?;
    let env = connect(env_config, setup, log)?;

    for (target, mapping) in mapped_targets(&setup.config, env_config, log) {
        let stage = format!("{} → {}", target.name, env_config.name);
        run_target(&stage, log, || {
            install_target(env.as_ref(), target, mapping, dry_run, log)
        });
    }
    finish(log)
}

/// Create the adapter for `env_config` and make sure it is reachable.
pub(super) fn connect(
    env_config: &EnvironmentConfig,
    setup: &CommandSetup,
    log: &Logger,
) -> Result<Box<dyn Environment>> {
    let env = environments::create(env_config, setup.executor.clone())?;
    if !env.is_available() {
        let name = env.display_name();
        log.error(&format!("environment '{}' is not available", env_config.name));
        log.info(&format!("tip: {}", availability_tip(env.kind(), env_config)));
        return Err(EnvironmentError::Unavailable(name).into());
    }
    log.debug(&format!("using {}", env.display_name()));
    Ok(env)
}

fn availability_tip(kind: EnvironmentKind, env_config: &EnvironmentConfig) -> String {
    match kind {
        EnvironmentKind::Docker => format!(
            "start a container from image '{}'",
            env_config.image.as_deref().unwrap_or_default()
        ),
        EnvironmentKind::Ssh => format!(
            "check SSH connectivity to '{}'",
            env_config.host.as_deref().unwrap_or_default()
        ),
        EnvironmentKind::Local => "the local filesystem should always be available".to_string(),
    }
}

fn install_target(
    env: &dyn Environment,
    target: &TargetConfig,
    mapping: &EnvTargetConfig,
    dry_run: bool,
    log: &Logger,
) -> Result<TargetResult> {
    let source = target.local_path();
    if !source.exists() {
        return Ok(TargetResult::Skipped(format!(
            "directory not found: {}",
            target.local_dir
        )));
    }

    let staged = staging::prepare(&source, &target.sync_paths, mapping.resolve_symlinks)?;
    let present = staged.present(&target.sync_paths);
    if present.is_empty() {
        return Ok(TargetResult::Skipped("no sync paths found".to_string()));
    }

    for sp in &present {
        log.info(&format!("  {sp}"));
    }
    if mapping.resolve_symlinks {
        let count = staging::count_symlinks(&source, &target.sync_paths);
        if count > 0 {
            log.info(&format!("resolved {count} symlink(s)"));
        }
    }

    if dry_run {
        log.dry_run(&format!(
            "would deploy {} path(s) to {}",
            present.len(),
            mapping.target_dir
        ));
        return Ok(TargetResult::DryRun);
    }

    env.clean(&mapping.target_dir, &target.sync_paths);
    let deployed = env.deploy(staged.path(), &mapping.target_dir, &target.sync_paths)?;
    log.info(&format!(
        "deployed {} path(s) to {}",
        deployed.len(),
        mapping.target_dir
    ));
    Ok(TargetResult::Ok)
}
