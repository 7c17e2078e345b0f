//! Compare two [`FileTree`]s.
use similar::TextDiff;
use std::collections::BTreeSet;
use std::fmt;

use super::FileTree;

/// One difference between a local and a remote tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEntry {
    /// Present locally, absent remotely.
    LocalOnly(String),
    /// Present remotely, absent locally.
    RemoteOnly(String),
    /// Present on both sides with different content.
    Changed {
        /// Key shared by both trees.
        path: String,
        /// Unified diff from the remote content to the local content.
        diff: String,
    },
}

impl DiffEntry {
    /// Path the entry refers to.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::LocalOnly(path) | Self::RemoteOnly(path) | Self::Changed { path, .. } => path,
        }
    }
}

impl fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalOnly(path) => write!(f, "  + {path} (local only)"),
            Self::RemoteOnly(path) => write!(f, "  - {path} (remote only)"),
            Self::Changed { diff, .. } => f.write_str(diff),
        }
    }
}

/// Differences between `local` and `remote`, ordered by path.
///
/// Unified diffs read as "what changes if local is applied over remote":
/// the old side is `remote/<path>` and the new side `local/<path>`.
#[must_use]
pub fn diff_trees(local: &FileTree, remote: &FileTree) -> Vec<DiffEntry> {
    let paths: BTreeSet<&String> = local.keys().chain(remote.keys()).collect();

    paths
        .into_iter()
        .filter_map(|path| match (local.get(path), remote.get(path)) {
            (Some(_), None) => Some(DiffEntry::LocalOnly(path.clone())),
            (None, Some(_)) => Some(DiffEntry::RemoteOnly(path.clone())),
            (Some(l), Some(r)) if l != r => Some(DiffEntry::Changed {
                path: path.clone(),
                diff: unified_diff(path, r, l),
            }),
            _ => None,
        })
        .collect()
}

fn unified_diff(path: &str, remote: &str, local: &str) -> String {
    TextDiff::from_lines(remote, local)
        .unified_diff()
        .context_radius(3)
        .header(&format!("remote/{path}"), &format!("local/{path}"))
        .to_string()
}
