//! Where the log file lives, and how console colour is kept out of it.
use std::env;
use std::fs;
use std::path::PathBuf;

/// `s` without its ANSI escape sequences.
///
/// A CSI sequence (`ESC [`) runs up to its final byte in `@`..=`~`; any
/// other escape covers one following character.
pub(super) fn plain_text(s: &str) -> String {
    let mut parts = s.split('\x1b');
    let mut out = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let rest = part.strip_prefix('[').map_or_else(
            || part.chars().next().and_then(|c| part.get(c.len_utf8()..)),
            |csi| {
                csi.find(|c: char| ('@'..='~').contains(&c))
                    .and_then(|end| csi.get(end + 1..))
            },
        );
        out.push_str(rest.unwrap_or_default());
    }
    out
}

/// `$XDG_CACHE_HOME/kitchen-sync`, falling back to `~/.cache/kitchen-sync`.
fn log_dir() -> Option<PathBuf> {
    let cache = env::var_os("XDG_CACHE_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            env::var_os("HOME")
                .or_else(|| env::var_os("USERPROFILE"))
                .map(|home| PathBuf::from(home).join(".cache"))
        })?;
    let dir = cache.join("kitchen-sync");
    fs::create_dir_all(&dir).ok()?;
    Some(dir)
}

/// Log file for one `command`, with its directory created.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    log_dir().map(|dir| dir.join(format!("{command}.log")))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_drops_colour_codes() {
        assert_eq!(
            plain_text("\x1b[32m✓ claude\x1b[0m (2 paths)"),
            "✓ claude (2 paths)"
        );
        assert_eq!(plain_text("no escapes"), "no escapes");
        assert_eq!(plain_text(""), "");
    }

    #[test]
    fn plain_text_drops_other_escapes() {
        assert_eq!(plain_text("\x1b[2Kdone"), "done");
        assert_eq!(plain_text("\x1bMup"), "up");
        assert_eq!(plain_text("cut\x1b["), "cut");
    }

    #[test]
    fn log_file_is_named_after_the_command() {
        let _lock = crate::logging::TEST_ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let tmp = tempfile::tempdir().unwrap();
        // SAFETY: Protected by TEST_ENV_MUTEX; restored before lock is released.
        #[allow(unsafe_code)]
        unsafe {
            env::set_var("XDG_CACHE_HOME", tmp.path());
        }
        let path = log_file_path("push");
        // SAFETY: As above.
        #[allow(unsafe_code)]
        unsafe {
            env::remove_var("XDG_CACHE_HOME");
        }
        assert_eq!(path, Some(tmp.path().join("kitchen-sync/push.log")));
        assert!(tmp.path().join("kitchen-sync").is_dir());
    }
}
