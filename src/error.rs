//! Domain-specific error types for the sync engine.
//!
//! Library modules return typed errors (e.g., [`ValidationError`],
//! [`GitError`]) while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! SyncError
//! ├── Config(ConfigError)          : config file I/O, TOML, lookups
//! ├── Validation(ValidationError)  : sync paths, image names, hosts
//! ├── Environment(EnvironmentError): adapter construction and transfers
//! └── Git(GitError)                : git subprocess failures
//! ```

use thiserror::Error;

/// Top-level error type for the sync engine.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Configuration-related error (file I/O, parsing, unknown names).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A value failed validation before any subprocess was spawned.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Environment adapter error.
    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    /// Git operation error.
    #[error("Git error: {0}")]
    Git(#[from] GitError),
}

/// Errors that arise while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading the config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected schema.
    #[error("Invalid config file {path}: {message}")]
    Parse {
        /// Path to the offending file.
        path: String,
        /// Parser message.
        message: String,
    },

    /// No target with this name is configured.
    #[error("Target '{0}' not found")]
    UnknownTarget(String),

    /// No environment with this name is configured.
    #[error("Environment '{0}' not found")]
    UnknownEnvironment(String),
}

/// Rejected input values.
///
/// Raised synchronously at load or construction time, before any external
/// process sees the value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A sync path is empty, absolute, or escapes its root.
    #[error("Invalid sync path '{path}': {reason}")]
    SyncPath {
        /// The rejected path, with NUL bytes escaped.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A Docker image name contains characters outside the allow-list.
    #[error("Invalid Docker image name '{image}': {reason}")]
    Image {
        /// The rejected image name, with NUL bytes escaped.
        image: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An SSH host could be interpreted as an option or is malformed.
    #[error("Invalid SSH host '{host}': {reason}")]
    Host {
        /// The rejected host, with NUL bytes escaped.
        host: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors raised by environment adapters.
#[derive(Error, Debug)]
pub enum EnvironmentError {
    /// The configured `type` is not one of local, docker, ssh.
    #[error("Unknown environment type: {0}")]
    UnknownType(String),

    /// A field required by the environment type is absent.
    #[error("Environment '{env}' of type {kind} requires '{field}'")]
    MissingField {
        /// Environment name.
        env: String,
        /// Environment type.
        kind: String,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The environment cannot be reached (no container, host down).
    #[error("{0} is not available")]
    Unavailable(String),

    /// Copying a sync path into the environment failed.
    #[error("Transfer of '{path}' failed: {message}")]
    TransferFailed {
        /// Sync path being transferred.
        path: String,
        /// Output of the transfer tool.
        message: String,
    },
}

/// Errors raised by git operations.
#[derive(Error, Debug)]
pub enum GitError {
    /// A git invocation exited non-zero.
    #[error("git {command} failed: {message}")]
    CommandFailed {
        /// The git subcommand (e.g. `commit`).
        command: String,
        /// git's own message.
        message: String,
    },

    /// `git pull` did not succeed; carries git's message verbatim.
    #[error("{0}")]
    PullFailed(String),
}
