//! Targets and environments, loaded from a TOML file.
//!
//! The configuration is plain data: the command layer reads it and hands
//! individual records to the staging, environment and git modules.
pub mod toml_loader;
pub mod validation;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use validation::SyncPath;

use crate::error::ConfigError;

/// Current config schema version.
pub const CONFIG_VERSION: u32 = 1;

const fn default_version() -> u32 {
    CONFIG_VERSION
}

const fn default_true() -> bool {
    true
}

/// Root configuration object.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Targets in the order they are processed.
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
    #[serde(default)]
    pub environments: BTreeMap<String, EnvironmentConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            targets: Vec::new(),
            environments: BTreeMap::new(),
        }
    }
}

/// A syncable config directory backed by a git repository.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub name: String,
    pub profile: String,
    pub repo: String,
    pub local_dir: String,
    #[serde(default)]
    pub sync_paths: Vec<SyncPath>,
    /// Extra environment variables (e.g. proxies) for git invocations.
    #[serde(default)]
    pub git_env: BTreeMap<String, String>,
}

impl TargetConfig {
    /// The local directory with a leading `~` expanded.
    #[must_use]
    pub fn local_path(&self) -> PathBuf {
        expand_tilde(&self.local_dir)
    }
}

/// Per-target settings within an environment.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvTargetConfig {
    /// Directory inside the environment that receives the sync paths.
    pub target_dir: String,
    #[serde(default = "default_true")]
    pub resolve_symlinks: bool,
}

/// A deployment destination: the local machine, a container, or an SSH host.
#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Filled in from the table key after loading.
    #[serde(skip)]
    pub name: String,
    /// `local`, `docker` or `ssh`; checked when the adapter is created.
    #[serde(rename = "type")]
    pub kind: String,
    /// Target name to per-target settings.
    #[serde(default)]
    pub targets: BTreeMap<String, EnvTargetConfig>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
}

impl Config {
    /// Load the configuration from `path`. A missing file yields an empty
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if any sync
    /// path fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml_loader::load_config(path)?;
        for (name, env) in &mut config.environments {
            env.name.clone_from(name);
        }
        tracing::debug!(
            "loaded {} target(s), {} environment(s) from {}",
            config.targets.len(),
            config.environments.len(),
            path.display()
        );
        Ok(config)
    }

    /// Default location: `$XDG_CONFIG_HOME/kitchen-sync/config.toml`, or
    /// `~/.config/kitchen-sync/config.toml`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map_or_else(|| home_dir().join(".config"), PathBuf::from);
        base.join("kitchen-sync").join("config.toml")
    }

    /// Look up a target by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTarget`] if no target has this name.
    pub fn target(&self, name: &str) -> Result<&TargetConfig, ConfigError> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ConfigError::UnknownTarget(name.to_string()))
    }

    /// Look up an environment by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownEnvironment`] if no environment has this name.
    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig, ConfigError> {
        self.environments
            .get(name)
            .ok_or_else(|| ConfigError::UnknownEnvironment(name.to_string()))
    }

    /// Targets to operate on: all of them, or only `name` when given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownTarget`] if `name` is given but unknown.
    pub fn select_targets(&self, name: Option<&str>) -> Result<Vec<&TargetConfig>, ConfigError> {
        match name {
            Some(name) => Ok(vec![self.target(name)?]),
            None => Ok(self.targets.iter().collect()),
        }
    }
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_or_else(|_| PathBuf::from("."), PathBuf::from)
}

/// Expand a leading `~` or `~/` to the home directory.
#[must_use]
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        return home_dir();
    }
    path.strip_prefix("~/")
        .map_or_else(|| PathBuf::from(path), |rest| home_dir().join(rest))
}
