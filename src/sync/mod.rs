//! The sync engine: staging, tree collection, diffing and git coordination.
//!
//! Deploying a target stages its sync paths ([`staging`]) and hands the
//! staged tree to an environment. Comparing against an environment collects
//! both sides into [`FileTree`]s ([`collect`]) and diffs them ([`diff`]).
//! Pushing and pulling go through [`git`] against the target's local
//! directory, independent of staging.
pub mod collect;
pub mod diff;
pub mod git;
pub mod staging;

use std::collections::BTreeMap;

/// Relative `/`-separated path to text content.
pub type FileTree = BTreeMap<String, String>;

/// Content recorded for files that cannot be read as UTF-8 text.
pub const BINARY_SENTINEL: &str = "<binary>";

/// `bytes` as text, or [`BINARY_SENTINEL`] when they are not valid UTF-8.
#[must_use]
pub fn text_or_sentinel(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|_| BINARY_SENTINEL.to_string())
}
