//! A running Docker container as an environment.
use anyhow::Result;
use std::cell::OnceCell;
use std::path::Path;
use std::sync::Arc;

use super::{Environment, EnvironmentKind, remote, remote_path};
use crate::config::SyncPath;
use crate::config::validation::validate_image;
use crate::error::{EnvironmentError, ValidationError};
use crate::exec::{ExecResult, Executor};

/// Deploys into the most recent running container started from an image.
///
/// The container id is discovered on first use and cached for the lifetime
/// of the adapter.
#[derive(Debug)]
pub struct DockerEnvironment {
    image: String,
    executor: Arc<dyn Executor>,
    container_id: OnceCell<String>,
}

impl DockerEnvironment {
    /// Create an adapter for containers of `image`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Image`] if `image` is empty, contains a NUL
    /// byte, or has characters outside `[A-Za-z0-9._/:@-]`.
    pub fn new(image: &str, executor: Arc<dyn Executor>) -> Result<Self, ValidationError> {
        validate_image(image)?;
        Ok(Self {
            image: image.to_string(),
            executor,
            container_id: OnceCell::new(),
        })
    }

    /// Use `id` instead of discovering the container.
    #[must_use]
    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = OnceCell::from(id.into());
        self
    }

    /// The container id, discovering it on first call.
    #[must_use]
    pub fn container_id(&self) -> Option<&str> {
        if let Some(id) = self.container_id.get() {
            return Some(id);
        }
        let id = self.discover()?;
        Some(self.container_id.get_or_init(|| id))
    }

    fn discover(&self) -> Option<String> {
        if !self.executor.which("docker") {
            tracing::debug!("docker not found on PATH");
            return None;
        }
        let filter = format!("ancestor={}", self.image);
        let out = self
            .executor
            .run_unchecked("docker", &["ps", "--filter", &filter, "--format", "{{.ID}}"])
            .ok()?;
        if !out.success {
            tracing::debug!("docker ps failed: {}", out.message());
            return None;
        }
        let id = out
            .stdout
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())?
            .to_string();
        tracing::debug!("found container {id} for image {}", self.image);
        Some(id)
    }

    fn require_container(&self) -> Result<&str, EnvironmentError> {
        self.container_id()
            .ok_or_else(|| EnvironmentError::Unavailable(format!("docker image {}", self.image)))
    }

    fn mkdir(&self, dir: &str) -> Result<(), EnvironmentError> {
        let out = self.run(&["mkdir", "-p", dir]);
        if out.success {
            Ok(())
        } else {
            Err(EnvironmentError::TransferFailed {
                path: dir.to_string(),
                message: out.message().to_string(),
            })
        }
    }
}

impl Environment for DockerEnvironment {
    fn kind(&self) -> EnvironmentKind {
        EnvironmentKind::Docker
    }

    fn display_name(&self) -> String {
        match self.container_id.get() {
            Some(id) => format!("docker container {}", id.get(..12).unwrap_or(id)),
            None => format!("docker image {}", self.image),
        }
    }

    fn is_available(&self) -> bool {
        self.container_id().is_some()
    }

    fn run(&self, segments: &[&str]) -> ExecResult {
        let Some(id) = self.container_id() else {
            return ExecResult::not_run(format!("no running container for image {}", self.image));
        };
        let mut args = vec!["exec", id];
        args.extend(segments);
        self.executor
            .run_unchecked("docker", &args)
            .unwrap_or_else(|e| ExecResult::not_run(format!("{e:#}")))
    }

    fn read_file(&self, path: &str) -> Option<String> {
        remote::read_file(self, path)
    }

    fn list_files(&self, dir: &str) -> Vec<String> {
        remote::list_files(self, dir, dir)
    }

    fn deploy(
        &self,
        staging: &Path,
        target_dir: &str,
        sync_paths: &[SyncPath],
    ) -> Result<Vec<SyncPath>> {
        let id = self.require_container()?.to_string();
        self.mkdir(target_dir)?;

        let mut deployed = Vec::new();
        for sp in sync_paths {
            let src = staging.join(sp);
            let Ok(meta) = src.symlink_metadata() else {
                continue;
            };
            let dest = remote_path(target_dir, sp);
            if let Some(parent) = remote::parent(&dest) {
                self.mkdir(parent)?;
            }
            if meta.is_dir() {
                // `docker cp` nests a directory inside an existing one.
                self.run(&["rm", "-rf", &dest]);
            }

            let source = src.to_string_lossy();
            let destination = format!("{id}:{dest}");
            let out = self
                .executor
                .run_unchecked("docker", &["cp", &source, &destination])?;
            if !out.success {
                return Err(EnvironmentError::TransferFailed {
                    path: sp.to_string(),
                    message: out.message().to_string(),
                }
                .into());
            }
            tracing::debug!("copied {} to {destination}", src.display());
            deployed.push(sp.clone());
        }
        Ok(deployed)
    }

    fn clean(&self, target_dir: &str, sync_paths: &[SyncPath]) {
        for sp in sync_paths {
            let out = self.run(&["rm", "-rf", &remote_path(target_dir, sp)]);
            if !out.success {
                tracing::debug!("clean {sp}: {}", out.message());
            }
        }
    }
}
