// Shared helpers for integration tests.
//
// Provides a temporary source tree builder and a recording executor so each
// integration test can set up an isolated fixture without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, clippy::new_without_default)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use kitchen_sync::config::SyncPath;
use kitchen_sync::config::validation::sync_paths;
use kitchen_sync::exec::{ExecResult, Executor};

/// An isolated source tree backed by a [`tempfile::TempDir`].
pub struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create fixture dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn file(self, rel: &str, content: &str) -> Self {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("create parent");
        std::fs::write(path, content).expect("write fixture file");
        self
    }

    pub fn dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.path(rel)).expect("create fixture dir");
        self
    }

    /// Create a symlink at `rel` pointing to `target`.
    #[cfg(unix)]
    pub fn symlink(self, target: &Path, rel: &str) -> Self {
        let link = self.path(rel);
        std::fs::create_dir_all(link.parent().expect("parent")).expect("create parent");
        std::os::unix::fs::symlink(target, link).expect("create symlink");
        self
    }
}

pub fn paths(raw: &[&str]) -> Vec<SyncPath> {
    sync_paths(raw).expect("valid sync paths")
}

/// Every file under `root`, as sorted `/`-separated relative paths with content.
pub fn snapshot(root: &Path) -> Vec<(String, String)> {
    let mut files: Vec<(String, String)> = walkdir::WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .expect("under root")
                .to_string_lossy()
                .replace('\\', "/");
            let content = std::fs::read_to_string(e.path()).unwrap_or_default();
            (rel, content)
        })
        .collect();
    files.sort();
    files
}

/// Executor that records every command line and answers from a queue.
///
/// An exhausted queue answers with a failed result.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    responses: Mutex<VecDeque<ExecResult>>,
    lines: Mutex<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new(responses: Vec<ExecResult>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("lines lock").clone()
    }

    fn answer(&self, program: &str, args: &[&str]) -> ExecResult {
        let mut line = vec![program];
        line.extend(args);
        self.lines.lock().expect("lines lock").push(line.join(" "));
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| ExecResult::not_run("unexpected call"))
    }
}

impl Executor for RecordingExecutor {
    fn run_unchecked(&self, program: &str, args: &[&str]) -> anyhow::Result<ExecResult> {
        Ok(self.answer(program, args))
    }

    fn run_in_with_env_unchecked(
        &self,
        _dir: &Path,
        program: &str,
        args: &[&str],
        _env: &[(&str, &str)],
    ) -> anyhow::Result<ExecResult> {
        Ok(self.answer(program, args))
    }

    fn which(&self, _program: &str) -> bool {
        true
    }
}

pub fn ok(stdout: &str) -> ExecResult {
    ExecResult {
        stdout: stdout.to_string(),
        stderr: String::new(),
        success: true,
        code: Some(0),
    }
}
