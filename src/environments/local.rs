//! The local filesystem as an environment.
use anyhow::{Context as _, Result};
use std::path::Path;
use std::sync::Arc;

use super::{Environment, EnvironmentKind};
use crate::config::{SyncPath, expand_tilde};
use crate::exec::{ExecResult, Executor};
use crate::fs;
use crate::sync::text_or_sentinel;

/// Deploys into a directory on this machine.
#[derive(Debug)]
pub struct LocalEnvironment {
    executor: Arc<dyn Executor>,
}

impl LocalEnvironment {
    /// Create a local environment; `executor` serves [`Environment::run`].
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl Environment for LocalEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Local
    }

    fn display_name(&self) -> String {
        "local".to_string()
    }

    fn is_available(&self) -> bool {
        true
    }

    fn run(&self, segments: &[&str]) -> ExecResult {
        let Some((program, args)) = segments.split_first() else {
            return ExecResult::not_run("empty command");
        };
        self.executor
            .run_unchecked(program, args)
            .unwrap_or_else(|e| ExecResult::not_run(format!("{e:#}")))
    }

    fn read_file(&self, path: &str) -> Option<String> {
        std::fs::read(expand_tilde(path)).ok().map(text_or_sentinel)
    }

    fn list_files(&self, dir: &str) -> Vec<String> {
        let root = expand_tilde(dir);
        let mut files: Vec<String> = walkdir::WalkDir::new(&root)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.path().strip_prefix(&root).ok().map(fs::slash_path))
            .collect();
        files.sort();
        files
    }

    fn deploy(
        &self,
        staging: &Path,
        target_dir: &str,
        sync_paths: &[SyncPath],
    ) -> Result<Vec<SyncPath>> {
        let root = expand_tilde(target_dir);
        std::fs::create_dir_all(&root)
            .with_context(|| format!("creating target directory {}", root.display()))?;

        let mut deployed = Vec::new();
        for sp in sync_paths {
            let src = staging.join(sp);
            let Ok(meta) = src.symlink_metadata() else {
                continue;
            };
            let dst = root.join(sp);
            fs::ensure_parent_dir(&dst)?;
            fs::remove_path(&dst)?;

            if meta.is_dir() {
                fs::copy_tree(&src, &dst)?;
            } else if meta.is_symlink() {
                fs::copy_symlink(&src, &dst)?;
            } else {
                fs::copy_file(&src, &dst)?;
            }
            tracing::debug!("deployed {sp} to {}", dst.display());
            deployed.push(sp.clone());
        }
        Ok(deployed)
    }

    fn clean(&self, target_dir: &str, sync_paths: &[SyncPath]) {
        let root = expand_tilde(target_dir);
        for sp in sync_paths {
            if let Err(e) = fs::remove_path(&root.join(sp)) {
                tracing::debug!("clean {sp}: {e:#}");
            }
        }
    }
}
