//! Validation of values that end up on subprocess command lines.
//!
//! Everything here runs before any external process is spawned: a value
//! that fails validation never reaches `docker`, `ssh`, `rsync` or `git`.
use serde::Deserialize;
use std::fmt;
use std::path::{Component, Path};

use crate::error::ValidationError;

/// Characters allowed in a Docker image reference besides ASCII alphanumerics.
const IMAGE_EXTRA_CHARS: &[char] = &['.', '_', '/', ':', '@', '-'];

/// Render a user-supplied value for an error message.
fn escape(value: &str) -> String {
    value.replace('\0', "\\0")
}

/// A relative path naming a file or directory tracked by a target.
///
/// Never empty, never absolute, never contains a NUL byte, and never
/// normalizes to the root itself or to anything above it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub struct SyncPath(String);

impl SyncPath {
    /// Validate `path` and wrap it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::SyncPath`] if the path is empty, contains a
    /// NUL byte, is absolute, or escapes (or collapses to) its root.
    pub fn new(path: impl Into<String>) -> Result<Self, ValidationError> {
        let path = path.into();
        let reject = |reason: &str| ValidationError::SyncPath {
            path: escape(&path),
            reason: reason.to_string(),
        };

        if path.is_empty() {
            return Err(reject("must not be empty"));
        }
        if path.contains('\0') {
            return Err(reject("contains a NUL byte"));
        }
        if path.starts_with('/') || path.starts_with('\\') || Path::new(&path).is_absolute() {
            return Err(reject("must be relative"));
        }

        let mut depth: usize = 0;
        for component in Path::new(&path).components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::CurDir => {}
                Component::ParentDir => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| reject("escapes the target root"))?;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(reject("must be relative"));
                }
            }
        }
        if depth == 0 {
            return Err(reject("does not name anything below the target root"));
        }

        Ok(Self(path))
    }

    /// The path as written in the configuration.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SyncPath {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SyncPath {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl AsRef<Path> for SyncPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl AsRef<str> for SyncPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a list of raw strings into sync paths.
///
/// # Errors
///
/// Returns the first validation failure.
pub fn sync_paths<S: AsRef<str>>(raw: &[S]) -> Result<Vec<SyncPath>, ValidationError> {
    raw.iter().map(|p| SyncPath::new(p.as_ref())).collect()
}

/// Check a Docker image reference against the allow-list
/// `[A-Za-z0-9._/:@-]+`.
///
/// # Errors
///
/// Returns [`ValidationError::Image`] on a NUL byte, an empty name, or any
/// character outside the allow-list (spaces, quotes, `$`, `;`, …).
pub fn validate_image(image: &str) -> Result<(), ValidationError> {
    let reject = |reason: &str| ValidationError::Image {
        image: escape(image),
        reason: reason.to_string(),
    };
    if image.contains('\0') {
        return Err(reject("contains a NUL byte"));
    }
    if image.is_empty() {
        return Err(reject("must not be empty"));
    }
    if let Some(bad) = image
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !IMAGE_EXTRA_CHARS.contains(c))
    {
        return Err(reject(&format!("character {bad:?} is not allowed")));
    }
    Ok(())
}

/// Check an SSH host so it cannot be parsed as an `ssh` option.
///
/// # Errors
///
/// Returns [`ValidationError::Host`] if the host is empty, starts with `-`,
/// or contains a NUL byte.
pub fn validate_host(host: &str) -> Result<(), ValidationError> {
    let reject = |reason: &str| ValidationError::Host {
        host: escape(host),
        reason: reason.to_string(),
    };
    if host.contains('\0') {
        return Err(reject("contains a NUL byte"));
    }
    if host.is_empty() {
        return Err(reject("must not be empty"));
    }
    if host.starts_with('-') {
        return Err(reject("must not start with '-'"));
    }
    Ok(())
}
