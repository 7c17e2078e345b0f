//! Config-directory sync engine.
//!
//! Keeps tool configuration directories (`~/.claude`, `~/.cursor`, …) under
//! git and deploys selected sync paths into local, Docker and SSH
//! environments. Targets and environments are declared in a TOML file.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: load and validate the TOML configuration
//! - **[`sync`]**: staging, tree collection, tree diffing and git coordination
//! - **[`environments`]**: the [`Environment`](environments::Environment)
//!   contract and its local, Docker and SSH adapters
//! - **[`commands`]**: subcommand orchestration (`status`, `push`, `pull`,
//!   `install`, `diff`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod environments;
pub mod error;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod sync;
