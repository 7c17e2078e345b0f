//! Staging: materialize the selected sync paths into a fresh temporary tree.
//!
//! A [`StagingArea`] is created per deploy or diff call and removed when it
//! is dropped, so the directory disappears on every exit path.
use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use crate::config::SyncPath;
use crate::fs;

/// Prefix of staging directory names under the system temp dir.
const STAGING_PREFIX: &str = "ksync-";

/// An ephemeral directory holding a prepared copy of some sync paths.
#[derive(Debug)]
pub struct StagingArea {
    dir: tempfile::TempDir,
}

impl StagingArea {
    /// Create an empty staging directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir()
            .context("creating staging directory")?;
        Ok(Self { dir })
    }

    /// Root of the staged tree.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The requested sync paths that actually made it into staging, in order.
    #[must_use]
    pub fn present<'a>(&self, sync_paths: &'a [SyncPath]) -> Vec<&'a SyncPath> {
        sync_paths
            .iter()
            .filter(|sp| fs::entry_exists(&self.path().join(sp)))
            .collect()
    }
}

/// Copy `sync_paths` from `source` into a new [`StagingArea`].
///
/// Paths that do not exist under `source` are skipped. Directories (and
/// symlinks to directories) named directly by a sync path are always
/// recursed. Below that, `resolve_symlinks` decides the policy for every
/// symlink: `false` recreates the link verbatim, `true` copies what it points
/// to and silently skips broken links.
///
/// # Errors
///
/// Returns an error if the staging directory cannot be created or an entry
/// cannot be copied.
pub fn prepare(
    source: &Path,
    sync_paths: &[SyncPath],
    resolve_symlinks: bool,
) -> Result<StagingArea> {
    let staging = StagingArea::new()?;
    tracing::debug!(
        "staging {} path(s) from {} into {} (resolve symlinks: {resolve_symlinks})",
        sync_paths.len(),
        source.display(),
        staging.path().display()
    );

    for sp in sync_paths {
        let src = source.join(sp);
        if !src.exists() {
            tracing::debug!("not in source, skipping: {sp}");
            continue;
        }
        let dst = staging.path().join(sp);
        fs::ensure_parent_dir(&dst)?;

        if src.is_dir() {
            copy_dir(&src, &dst, resolve_symlinks, &mut Vec::new())?;
        } else if is_symlink(&src) && !resolve_symlinks {
            fs::copy_symlink(&src, &dst)?;
        } else {
            fs::copy_file(&src, &dst)?;
        }
    }

    Ok(staging)
}

/// Count symlinks at or beneath the sync paths under `source`.
///
/// A sync path that is itself a symlink counts once and is not descended.
#[must_use]
pub fn count_symlinks(source: &Path, sync_paths: &[SyncPath]) -> usize {
    sync_paths
        .iter()
        .map(|sp| source.join(sp))
        .filter(|src| src.exists())
        .map(|src| {
            if is_symlink(&src) {
                1
            } else if src.is_dir() {
                walkdir::WalkDir::new(&src)
                    .min_depth(1)
                    .into_iter()
                    .filter_map(Result::ok)
                    .filter(|e| e.path_is_symlink())
                    .count()
            } else {
                0
            }
        })
        .sum()
}

fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.is_symlink())
}

/// Copy the directory `src` to `dst`, applying the symlink policy to every
/// entry. `ancestors` holds the canonical paths of directories currently
/// being copied, so a link that points back up the tree is not followed
/// forever.
fn copy_dir(src: &Path, dst: &Path, resolve: bool, ancestors: &mut Vec<PathBuf>) -> Result<()> {
    let canonical = canonical_path(src)?;
    if ancestors.contains(&canonical) {
        tracing::warn!("symlink cycle at {}, skipping", src.display());
        return Ok(());
    }
    ancestors.push(canonical);

    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;

    let mut entries = std::fs::read_dir(src)
        .with_context(|| format!("reading directory {}", src.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("reading entry in {}", src.display()))?;
    entries.sort_by_key(std::fs::DirEntry::file_name);

    for entry in entries {
        let item = entry.path();
        let item_dst = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("reading type of {}", item.display()))?;

        if file_type.is_symlink() {
            if !resolve {
                fs::copy_symlink(&item, &item_dst)?;
                continue;
            }
            match std::fs::metadata(&item) {
                Ok(meta) if meta.is_dir() => copy_dir(&item, &item_dst, resolve, ancestors)?,
                Ok(meta) if meta.is_file() => fs::copy_file(&item, &item_dst)?,
                Ok(_) => tracing::debug!("skipping special file {}", item.display()),
                Err(_) => tracing::debug!("skipping broken symlink {}", item.display()),
            }
        } else if file_type.is_dir() {
            copy_dir(&item, &item_dst, resolve, ancestors)?;
        } else if file_type.is_file() {
            fs::copy_file(&item, &item_dst)?;
        } else {
            tracing::debug!("skipping special file {}", item.display());
        }
    }

    ancestors.pop();
    Ok(())
}

fn canonical_path(path: &Path) -> Result<PathBuf> {
    std::fs::canonicalize(path).with_context(|| format!("resolving {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::validation::sync_paths;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn stages_only_present_paths() {
        let src = tempfile::tempdir().unwrap();
        write(&src.path().join("CLAUDE.md"), "# hi\n");
        write(&src.path().join("skills/a.md"), "a\n");

        let paths = sync_paths(&["CLAUDE.md", "missing.json", "skills"]).unwrap();
        let staging = prepare(src.path(), &paths, false).unwrap();

        let present: Vec<&str> = staging.present(&paths).iter().map(|p| p.as_str()).collect();
        assert_eq!(present, vec!["CLAUDE.md", "skills"]);
        assert_eq!(
            std::fs::read_to_string(staging.path().join("skills/a.md")).unwrap(),
            "a\n"
        );
        assert!(!staging.path().join("missing.json").exists());
    }

    #[test]
    fn stages_nested_sync_path_with_parents() {
        let src = tempfile::tempdir().unwrap();
        write(&src.path().join("agents/reviewer.md"), "r\n");
        write(&src.path().join("agents/other.md"), "o\n");

        let paths = sync_paths(&["agents/reviewer.md"]).unwrap();
        let staging = prepare(src.path(), &paths, true).unwrap();

        assert!(staging.path().join("agents/reviewer.md").is_file());
        assert!(!staging.path().join("agents/other.md").exists());
    }

    #[test]
    fn staging_directory_is_removed_on_drop() {
        let src = tempfile::tempdir().unwrap();
        write(&src.path().join("f"), "x");
        let staging = prepare(src.path(), &sync_paths(&["f"]).unwrap(), false).unwrap();
        let root = staging.path().to_path_buf();
        assert!(root.exists());
        assert!(
            root.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with(STAGING_PREFIX)
        );
        drop(staging);
        assert!(!root.exists());
    }

    #[cfg(unix)]
    mod symlinks {
        use super::*;
        use std::os::unix::fs::symlink;

        #[test]
        fn file_symlink_kept_as_link_without_resolution() {
            let src = tempfile::tempdir().unwrap();
            write(&src.path().join("real.json"), "{}");
            symlink("real.json", src.path().join("settings.json")).unwrap();

            let paths = sync_paths(&["settings.json"]).unwrap();
            let staging = prepare(src.path(), &paths, false).unwrap();

            let staged = staging.path().join("settings.json");
            assert!(is_symlink(&staged));
            assert_eq!(std::fs::read_link(staged).unwrap(), Path::new("real.json"));
        }

        #[test]
        fn file_symlink_copied_with_resolution() {
            let src = tempfile::tempdir().unwrap();
            write(&src.path().join("real.json"), "{}");
            symlink("real.json", src.path().join("settings.json")).unwrap();

            let paths = sync_paths(&["settings.json"]).unwrap();
            let staging = prepare(src.path(), &paths, true).unwrap();

            let staged = staging.path().join("settings.json");
            assert!(!is_symlink(&staged));
            assert_eq!(std::fs::read_to_string(staged).unwrap(), "{}");
        }

        #[test]
        fn nested_directory_symlink_follows_policy() {
            let src = tempfile::tempdir().unwrap();
            let external = tempfile::tempdir().unwrap();
            write(
                &external.path().join("ext-skill.md"),
                "external skill content\n",
            );
            std::fs::create_dir(src.path().join("skills")).unwrap();
            symlink(external.path(), src.path().join("skills/ext-skill")).unwrap();
            let paths = sync_paths(&["skills"]).unwrap();

            let resolved = prepare(src.path(), &paths, true).unwrap();
            let dir = resolved.path().join("skills/ext-skill");
            assert!(dir.is_dir());
            assert!(!is_symlink(&dir));
            assert_eq!(
                std::fs::read_to_string(dir.join("ext-skill.md")).unwrap(),
                "external skill content\n"
            );

            let kept = prepare(src.path(), &paths, false).unwrap();
            assert!(is_symlink(&kept.path().join("skills/ext-skill")));
        }

        #[test]
        fn broken_symlink_skipped_when_resolving() {
            let src = tempfile::tempdir().unwrap();
            write(&src.path().join("skills/ok.md"), "ok");
            symlink("/nonexistent/nowhere", src.path().join("skills/broken")).unwrap();
            let paths = sync_paths(&["skills"]).unwrap();

            let staging = prepare(src.path(), &paths, true).unwrap();
            assert!(staging.path().join("skills/ok.md").is_file());
            assert!(!fs::entry_exists(&staging.path().join("skills/broken")));
        }

        #[test]
        fn broken_top_level_symlink_is_absent() {
            let src = tempfile::tempdir().unwrap();
            symlink("/nonexistent/nowhere", src.path().join("CLAUDE.md")).unwrap();
            let paths = sync_paths(&["CLAUDE.md"]).unwrap();

            let staging = prepare(src.path(), &paths, false).unwrap();
            assert!(staging.present(&paths).is_empty());
        }

        #[test]
        fn top_level_directory_symlink_is_recursed() {
            let src = tempfile::tempdir().unwrap();
            let external = tempfile::tempdir().unwrap();
            write(&external.path().join("x.md"), "x");
            symlink(external.path(), src.path().join("agents")).unwrap();
            let paths = sync_paths(&["agents"]).unwrap();

            let staging = prepare(src.path(), &paths, false).unwrap();
            let staged = staging.path().join("agents");
            assert!(!is_symlink(&staged));
            assert!(staged.join("x.md").is_file());
        }

        #[test]
        fn symlink_cycle_does_not_recurse_forever() {
            let src = tempfile::tempdir().unwrap();
            write(&src.path().join("skills/a.md"), "a");
            symlink("..", src.path().join("skills/loop")).unwrap();
            let paths = sync_paths(&["skills"]).unwrap();

            let staging = prepare(src.path(), &paths, true).unwrap();
            assert!(staging.path().join("skills/a.md").is_file());
        }

        #[test]
        fn counts_symlinks_beneath_sync_paths() {
            let src = tempfile::tempdir().unwrap();
            write(&src.path().join("real.md"), "r");
            symlink("real.md", src.path().join("CLAUDE.md")).unwrap();
            write(&src.path().join("skills/a.md"), "a");
            symlink("a.md", src.path().join("skills/b.md")).unwrap();
            symlink("a.md", src.path().join("skills/c.md")).unwrap();

            let paths = sync_paths(&["CLAUDE.md", "skills", "absent"]).unwrap();
            assert_eq!(count_symlinks(src.path(), &paths), 3);
        }
    }
}
