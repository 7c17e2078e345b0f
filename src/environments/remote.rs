//! `cat`/`find` protocol shared by the container and SSH adapters.
use super::Environment;
use crate::sync::BINARY_SENTINEL;

/// Read `path` with `cat` inside `env`.
///
/// Output is decoded lossily on the way back, so a replacement character
/// marks content that was not UTF-8.
pub(super) fn read_file(env: &dyn Environment, path: &str) -> Option<String> {
    let out = env.run(&["cat", path]);
    if !out.success {
        return None;
    }
    if out.stdout.contains(char::REPLACEMENT_CHARACTER) {
        return Some(BINARY_SENTINEL.to_string());
    }
    Some(out.stdout)
}

/// List files below `dir` with `find`, stripping `prefix` from each line.
///
/// `prefix` is normally `dir` itself; it differs when the remote shell
/// expands part of `dir` (a leading `~`).
pub(super) fn list_files(env: &dyn Environment, dir: &str, prefix: &str) -> Vec<String> {
    let out = env.run(&["find", dir, "-type", "f"]);
    if !out.success {
        tracing::debug!("find {dir} failed: {}", out.message());
        return Vec::new();
    }
    parse_find_output(&out.stdout, prefix)
}

/// Paths in `find` output relative to `dir`, sorted. Lines outside `dir`
/// (including `dir` itself) are dropped.
pub(super) fn parse_find_output(stdout: &str, dir: &str) -> Vec<String> {
    let prefix = format!("{}/", dir.trim_end_matches('/'));
    let mut files: Vec<String> = stdout
        .lines()
        .filter_map(|line| line.strip_prefix(&prefix))
        .filter(|rel| !rel.is_empty())
        .map(str::to_string)
        .collect();
    files.sort();
    files
}

/// Parent of a `/`-separated remote path, if it has a non-root one.
pub(super) fn parent(path: &str) -> Option<&str> {
    path.rsplit_once('/')
        .map(|(parent, _)| parent)
        .filter(|p| !p.is_empty())
}
