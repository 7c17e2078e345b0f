//! File-system helpers shared by staging and the local environment.
use anyhow::{Context as _, Result};
use std::path::Path;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Returns `true` if something (including a broken symlink) exists at `path`.
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Remove whatever is at `path`: a directory tree, a file, or a symlink
/// (the link itself, never its target). Does nothing if `path` is absent.
///
/// # Errors
///
/// Returns an error if the entry exists but cannot be removed.
pub fn remove_path(path: &Path) -> Result<()> {
    let Ok(meta) = path.symlink_metadata() else {
        return Ok(());
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("remove directory: {}", path.display()))
    } else {
        std::fs::remove_file(path).with_context(|| format!("remove: {}", path.display()))
    }
}

/// Create a symlink at `link` whose link text is `target`.
///
/// `target` is used verbatim, so relative targets stay relative.
///
/// # Errors
///
/// Returns an error if the link cannot be created.
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(target, link);

    #[cfg(windows)]
    let result = {
        let resolved = link.parent().map_or_else(|| target.to_path_buf(), |p| p.join(target));
        if resolved.is_dir() {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        }
    };

    result.with_context(|| {
        format!(
            "creating symlink {} -> {}",
            link.display(),
            target.display()
        )
    })
}

/// Copy the symlink at `src` to `dst` as a symlink with the same link text.
///
/// # Errors
///
/// Returns an error if the link cannot be read or recreated.
pub fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target =
        std::fs::read_link(src).with_context(|| format!("reading link {}", src.display()))?;
    create_symlink(&target, dst)
}

/// Copy a single regular file, following symlinks at `src`.
///
/// # Errors
///
/// Returns an error if the file cannot be copied.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    std::fs::copy(src, dst)
        .with_context(|| format!("copying {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Recursively copy a directory tree *as is*: symlinks inside `src` are
/// recreated as symlinks rather than followed.
///
/// Used to transfer an already-prepared staging tree, where the symlink
/// policy has been applied.
///
/// # Errors
///
/// Returns an error if the destination directory cannot be created, a source
/// entry cannot be read, or a file cannot be copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for entry in
        std::fs::read_dir(src).with_context(|| format!("reading directory {}", src.display()))?
    {
        let entry = entry.with_context(|| format!("reading entry in {}", src.display()))?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry
            .file_type()
            .with_context(|| format!("reading type of {}", src_path.display()))?;
        if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else if file_type.is_dir() {
            copy_tree(&src_path, &dst_path)?;
        } else {
            copy_file(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

/// Join the components of a relative path with `/`, whatever the platform.
#[must_use]
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn copy_tree_copies_files_and_subdirectories() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();

        std::fs::write(src.path().join("a.txt"), b"aaa").unwrap();
        std::fs::create_dir(src.path().join("sub")).unwrap();
        std::fs::write(src.path().join("sub/b.txt"), b"bbb").unwrap();

        let target = dst.path().join("out");
        copy_tree(src.path(), &target).unwrap();

        assert_eq!(std::fs::read(target.join("a.txt")).unwrap(), b"aaa");
        assert_eq!(std::fs::read(target.join("sub/b.txt")).unwrap(), b"bbb");
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_preserves_symlinks() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        std::fs::write(src.path().join("real.md"), "x").unwrap();
        std::os::unix::fs::symlink("real.md", src.path().join("alias.md")).unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", src.path().join("dangling")).unwrap();

        let target = dst.path().join("out");
        copy_tree(src.path(), &target).unwrap();

        let alias = target.join("alias.md");
        assert!(alias.symlink_metadata().unwrap().is_symlink());
        assert_eq!(std::fs::read_link(&alias).unwrap(), Path::new("real.md"));
        assert!(entry_exists(&target.join("dangling")));
    }

    #[test]
    fn ensure_parent_dir_creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b").join("file.txt");
        ensure_parent_dir(&nested).unwrap();
        assert!(dir.path().join("a").join("b").exists());
    }

    #[test]
    fn remove_path_removes_file_and_tree() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "content").unwrap();
        let tree = dir.path().join("tree");
        std::fs::create_dir_all(tree.join("deep")).unwrap();
        std::fs::write(tree.join("deep/f"), "x").unwrap();

        remove_path(&file).unwrap();
        remove_path(&tree).unwrap();

        assert!(!file.exists());
        assert!(!tree.exists());
    }

    #[test]
    fn remove_path_noop_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        remove_path(&dir.path().join("nonexistent")).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn remove_path_removes_link_not_target() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        std::fs::create_dir(&real).unwrap();
        std::fs::write(real.join("keep"), "x").unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        remove_path(&link).unwrap();

        assert!(!entry_exists(&link));
        assert!(real.join("keep").exists());
    }

    #[test]
    fn slash_path_joins_with_forward_slashes() {
        assert_eq!(slash_path(Path::new("a").join("b").join("c.md").as_path()), "a/b/c.md");
    }
}
