//! Deployment destinations behind one [`Environment`] contract.
//!
//! Three variants implement it: [`local::LocalEnvironment`] works on the
//! local filesystem, [`docker::DockerEnvironment`] talks to a running
//! container and [`ssh::SshEnvironment`] to a remote host. Adapters are
//! created per command invocation by [`create`].
pub mod docker;
pub mod local;
mod remote;
pub mod ssh;

use anyhow::Result;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::config::{EnvironmentConfig, SyncPath};
use crate::error::{EnvironmentError, SyncError};
use crate::exec::{ExecResult, Executor};

/// Environment type tag, parsed from the config `type` field.
///
/// # Examples
///
/// ```
/// use kitchen_sync::environments::EnvironmentKind;
///
/// let kind: EnvironmentKind = "docker".parse().unwrap();
/// assert_eq!(kind, EnvironmentKind::Docker);
/// assert_eq!(kind.to_string(), "docker");
/// assert!("k8s".parse::<EnvironmentKind>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvironmentKind {
    /// The local filesystem.
    Local,
    /// A running Docker container.
    Docker,
    /// A host reached over SSH.
    Ssh,
}

impl FromStr for EnvironmentKind {
    type Err = EnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "docker" => Ok(Self::Docker),
            "ssh" => Ok(Self::Ssh),
            other => Err(EnvironmentError::UnknownType(other.to_string())),
        }
    }
}

impl fmt::Display for EnvironmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::Docker => "docker",
            Self::Ssh => "ssh",
        })
    }
}

/// Remote operations every environment supports.
///
/// Only [`deploy`](Environment::deploy) can fail. Everything else reports
/// problems as data: `false`, `None`, an empty list, or an unsuccessful
/// [`ExecResult`].
pub trait Environment: fmt::Debug {
    /// Which variant this is.
    fn kind(&self) -> EnvironmentKind;

    /// Short human-readable name for log lines.
    fn display_name(&self) -> String;

    /// Whether the environment can be reached right now.
    fn is_available(&self) -> bool;

    /// Run a command inside the environment. A non-zero exit is data.
    fn run(&self, segments: &[&str]) -> ExecResult;

    /// Text content of `path`, [`BINARY_SENTINEL`](crate::sync::BINARY_SENTINEL)
    /// when it exists but is not text, or `None` when it cannot be read.
    fn read_file(&self, path: &str) -> Option<String>;

    /// Files below `dir`, recursive, relative to `dir`, sorted. Empty when
    /// `dir` cannot be read.
    fn list_files(&self, dir: &str) -> Vec<String>;

    /// Transfer the sync paths present in `staging` to `target_dir`,
    /// returning the ones actually transferred.
    ///
    /// # Errors
    ///
    /// Returns an error if the target directory cannot be prepared or a
    /// transfer fails.
    fn deploy(
        &self,
        staging: &Path,
        target_dir: &str,
        sync_paths: &[SyncPath],
    ) -> Result<Vec<SyncPath>>;

    /// Best-effort recursive removal of each sync path under `target_dir`.
    fn clean(&self, target_dir: &str, sync_paths: &[SyncPath]);
}

/// Build the adapter described by `config`.
///
/// Connection data is validated here, before any subprocess runs.
///
/// # Errors
///
/// Returns [`EnvironmentError::UnknownType`] for an unrecognized `type`,
/// [`EnvironmentError::MissingField`] when a docker environment lacks an
/// image or an ssh environment lacks a host, and a
/// [`ValidationError`](crate::error::ValidationError) for an unsafe image or
/// host.
pub fn create(
    config: &EnvironmentConfig,
    executor: Arc<dyn Executor>,
) -> Result<Box<dyn Environment>, SyncError> {
    let kind: EnvironmentKind = config.kind.parse()?;
    let missing = |field: &'static str| EnvironmentError::MissingField {
        env: config.name.clone(),
        kind: kind.to_string(),
        field,
    };

    let env: Box<dyn Environment> = match kind {
        EnvironmentKind::Local => Box::new(local::LocalEnvironment::new(executor)),
        EnvironmentKind::Docker => {
            let image = config.image.as_deref().ok_or_else(|| missing("image"))?;
            Box::new(docker::DockerEnvironment::new(image, executor)?)
        }
        EnvironmentKind::Ssh => {
            let host = config.host.as_deref().ok_or_else(|| missing("host"))?;
            Box::new(ssh::SshEnvironment::new(host, executor)?)
        }
    };
    tracing::debug!("environment '{}': {}", config.name, env.display_name());
    Ok(env)
}

/// `target_dir/sync_path` as a `/`-separated remote path.
#[must_use]
pub fn remote_path(target_dir: &str, sync_path: &SyncPath) -> String {
    format!("{}/{}", target_dir.trim_end_matches('/'), sync_path)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::exec::test_helpers::MockExecutor;
    use std::collections::BTreeMap;

    fn env_config(kind: &str, image: Option<&str>, host: Option<&str>) -> EnvironmentConfig {
        EnvironmentConfig {
            name: "test".to_string(),
            kind: kind.to_string(),
            targets: BTreeMap::new(),
            image: image.map(str::to_string),
            host: host.map(str::to_string),
        }
    }

    fn build(
        config: &EnvironmentConfig,
    ) -> (Result<Box<dyn Environment>, SyncError>, Arc<MockExecutor>) {
        let mock = Arc::new(MockExecutor::with_responses(vec![]));
        (create(config, mock.clone()), mock)
    }

    #[test]
    fn factory_builds_each_kind() {
        let (local, _) = build(&env_config("local", None, None));
        assert_eq!(local.unwrap().kind(), EnvironmentKind::Local);
        let (docker, _) = build(&env_config("docker", Some("ubuntu:24.04"), None));
        assert_eq!(docker.unwrap().kind(), EnvironmentKind::Docker);
        let (ssh, _) = build(&env_config("ssh", None, Some("me@box")));
        assert_eq!(ssh.unwrap().kind(), EnvironmentKind::Ssh);
    }

    #[test]
    fn factory_rejects_unknown_type() {
        let (result, _) = build(&env_config("k8s", None, None));
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Environment(EnvironmentError::UnknownType(_))
        ));
        assert!(err.to_string().contains("Unknown environment type: k8s"));
    }

    #[test]
    fn factory_requires_connection_data() {
        let (docker, _) = build(&env_config("docker", None, None));
        assert_eq!(
            docker.unwrap_err().to_string(),
            "Environment error: Environment 'test' of type docker requires 'image'"
        );
        let (ssh, _) = build(&env_config("ssh", None, None));
        assert!(ssh.unwrap_err().to_string().contains("requires 'host'"));
    }

    #[test]
    fn unsafe_image_rejected_before_any_subprocess() {
        for image in ["ubuntu latest", "ubuntu\0"] {
            let (result, mock) = build(&env_config("docker", Some(image), None));
            assert!(matches!(
                result.unwrap_err(),
                SyncError::Validation(ValidationError::Image { .. })
            ));
            assert!(mock.calls().is_empty());
        }
    }

    #[test]
    fn flag_like_host_rejected_before_any_subprocess() {
        let (result, mock) = build(&env_config("ssh", None, Some("-oProxyCommand=evil")));
        assert!(matches!(
            result.unwrap_err(),
            SyncError::Validation(ValidationError::Host { .. })
        ));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn remote_path_joins_without_double_slash() {
        let sp = SyncPath::new("skills").unwrap();
        assert_eq!(remote_path("/home/dev/.claude/", &sp), "/home/dev/.claude/skills");
        assert_eq!(remote_path("~/.claude", &sp), "~/.claude/skills");
    }
}
