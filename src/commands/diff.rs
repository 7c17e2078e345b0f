//! Diff command: compare each mapped target with what an environment holds.
use anyhow::Result;
use std::io::Write;

use super::install::connect;
use super::{CommandSetup, TargetResult, finish, mapped_targets, run_target};
use crate::cli::{EnvOpts, GlobalOpts};
use crate::config::{EnvTargetConfig, TargetConfig};
use crate::environments::Environment;
use crate::logging::Logger;
use crate::sync::collect::{collect_files, collect_remote};
use crate::sync::diff::diff_trees;
use crate::sync::staging;

/// Run the diff command, writing differences to stdout.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the environment
/// is unknown or unreachable, or any target fails.
pub fn run(global: &GlobalOpts, opts: &EnvOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let stdout = std::io::stdout();
    execute(&setup, opts, &mut stdout.lock(), log)
}

/// Diff every target mapped by `opts.environment`, writing entries to `out`.
///
/// # Errors
///
/// Returns an error if the environment cannot be created or reached, or if
/// any target failed.
pub fn execute(
    setup: &CommandSetup,
    opts: &EnvOpts,
    out: &mut dyn Write,
    log: &Logger,
) -> Result<()> {
    let env_config = setup.config.environment(&opts.environment)?;
    let env = connect(env_config, setup, log)?;

    for (target, mapping) in mapped_targets(&setup.config, env_config, log) {
        let stage = format!("{} ↔ {}", target.name, env_config.name);
        run_target(&stage, log, || {
            diff_target(env.as_ref(), target, mapping, &mut *out, log)
        });
    }
    finish(log)
}

fn diff_target(
    env: &dyn Environment,
    target: &TargetConfig,
    mapping: &EnvTargetConfig,
    out: &mut dyn Write,
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
    let local = collect_files(staged.path(), &target.sync_paths);
    let remote = collect_remote(env, &mapping.target_dir, &target.sync_paths);

    let entries = diff_trees(&local, &remote);
    if entries.is_empty() {
        log.info("no differences");
        return Ok(TargetResult::Ok);
    }

    log.info(&format!("{} difference(s)", entries.len()));
    for entry in &entries {
        writeln!(out, "{entry}")?;
    }
    out.flush()?;
    Ok(TargetResult::Ok)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::commands::test_helpers::{config_from, setup_with};
    use crate::exec::test_helpers::MockResponse;
    use crate::logging::{Outcome, isolated_logger};
    use std::path::Path;

    const CONFIG: &str = r#"
[[targets]]
name = "claude"
profile = "claude"
repo = "r"
local_dir = "{root}/src"
sync_paths = ["CLAUDE.md", "skills"]

[environments.box]
type = "local"
targets = { claude = { target_dir = "{root}/dest" } }

[environments.remote]
type = "ssh"
host = "me@box"
targets = { claude = { target_dir = "/home/me/.claude" } }
"#;

    fn opts(env: &str) -> EnvOpts {
        EnvOpts {
            environment: env.to_string(),
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn reports_each_kind_of_difference() {
        let (log, _tmp, _guard) = isolated_logger();
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "src/CLAUDE.md", "one\ntwo\n");
        write(root.path(), "src/skills/new/SKILL.md", "new\n");
        write(root.path(), "dest/CLAUDE.md", "one\n");
        write(root.path(), "dest/skills/old/SKILL.md", "old\n");
        let (setup, _) = setup_with(config_from(CONFIG, root.path()), vec![]);

        let mut out = Vec::new();
        execute(&setup, &opts("box"), &mut out, &log).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("--- remote/CLAUDE.md"));
        assert!(text.contains("+++ local/CLAUDE.md"));
        assert!(text.contains("+two"));
        assert!(text.contains("  + skills/new/SKILL.md (local only)"));
        assert!(text.contains("  - skills/old/SKILL.md (remote only)"));
        assert_eq!(log.entries()[0].outcome, Outcome::Ok);
    }

    #[test]
    fn identical_trees_print_nothing() {
        let (log, _tmp, _guard) = isolated_logger();
        let root = tempfile::tempdir().unwrap();
        for side in ["src", "dest"] {
            write(root.path(), &format!("{side}/CLAUDE.md"), "same\n");
            write(root.path(), &format!("{side}/skills/a/SKILL.md"), "a\n");
        }
        let (setup, _) = setup_with(config_from(CONFIG, root.path()), vec![]);

        let mut out = Vec::new();
        execute(&setup, &opts("box"), &mut out, &log).unwrap();

        assert!(out.is_empty());
    }

    #[test]
    fn missing_remote_side_is_all_local_only() {
        let (log, _tmp, _guard) = isolated_logger();
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "src/CLAUDE.md", "");
        let (setup, _) = setup_with(config_from(CONFIG, root.path()), vec![]);

        let mut out = Vec::new();
        execute(&setup, &opts("box"), &mut out, &log).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "  + CLAUDE.md (local only)\n"
        );
    }

    #[test]
    fn unreachable_host_fails_without_diffing() {
        let (log, _tmp, _guard) = isolated_logger();
        let root = tempfile::tempdir().unwrap();
        write(root.path(), "src/CLAUDE.md", "x\n");
        let (setup, mock) = setup_with(
            config_from(CONFIG, root.path()),
            vec![MockResponse::fail("ssh: connect to host box port 22: Connection refused")],
        );

        let mut out = Vec::new();
        let err = execute(&setup, &opts("remote"), &mut out, &log).unwrap_err();

        assert!(err.to_string().contains("is not available"));
        assert_eq!(mock.calls().len(), 1);
        assert!(out.is_empty());
    }
}
