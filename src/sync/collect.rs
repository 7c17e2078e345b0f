//! Read a subset of a directory, or of a remote environment, into a [`FileTree`].
use std::path::Path;

use super::{BINARY_SENTINEL, FileTree, text_or_sentinel};
use crate::config::SyncPath;
use crate::environments::{Environment, remote_path};
use crate::fs::slash_path;

/// Collect the files under `base` named by `sync_paths`.
///
/// Missing paths are skipped. Directories are walked recursively in
/// lexicographic order and keyed by their path relative to `base`. Anything
/// that cannot be read as text is recorded as [`BINARY_SENTINEL`].
#[must_use]
pub fn collect_files(base: &Path, sync_paths: &[SyncPath]) -> FileTree {
    let mut tree = FileTree::new();

    for sp in sync_paths {
        let path = base.join(sp);
        if path.is_file() {
            tree.insert(sp.to_string(), read_text(&path));
        } else if path.is_dir() {
            let walker = walkdir::WalkDir::new(&path)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok);
            for entry in walker {
                if !entry.path().is_file() {
                    continue;
                }
                let Ok(rel) = entry.path().strip_prefix(base) else {
                    continue;
                };
                tree.insert(slash_path(rel), read_text(entry.path()));
            }
        }
    }

    tree
}

/// Collect the same sync paths from `target_dir` inside an environment.
///
/// Keys match [`collect_files`] run over a tree rooted at `target_dir`, so
/// the two sides can be diffed directly.
#[must_use]
pub fn collect_remote(env: &dyn Environment, target_dir: &str, sync_paths: &[SyncPath]) -> FileTree {
    let mut tree = FileTree::new();

    for sp in sync_paths {
        let dir = remote_path(target_dir, sp);
        let files = env.list_files(&dir);
        if files.is_empty() {
            if let Some(content) = env.read_file(&dir) {
                tree.insert(sp.to_string(), content);
            }
            continue;
        }
        for rel in files {
            let content = env
                .read_file(&format!("{dir}/{rel}"))
                .unwrap_or_else(|| BINARY_SENTINEL.to_string());
            tree.insert(format!("{sp}/{rel}"), content);
        }
    }

    tracing::debug!(
        "collected {} file(s) from {} at {target_dir}",
        tree.len(),
        env.display_name()
    );
    tree
}

fn read_text(path: &Path) -> String {
    std::fs::read(path).map_or_else(|_| BINARY_SENTINEL.to_string(), text_or_sentinel)
}
