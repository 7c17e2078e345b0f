use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default commit message for `push`.
pub const DEFAULT_COMMIT_MESSAGE: &str = "kitchen-sync: update configs";

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "kitchen-sync",
    about = "Keep git-backed config directories in sync across local, Docker and SSH environments",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Path to the config file (default: $XDG_CONFIG_HOME/kitchen-sync/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show uncommitted changes and upstream divergence per target
    Status,
    /// Commit and push each target's sync paths
    Push(PushOpts),
    /// Pull the latest changes for each target
    Pull(PullOpts),
    /// Deploy targets into an environment
    Install(EnvOpts),
    /// Show differences between local targets and an environment
    Diff(EnvOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Push(_) => "push",
            Self::Pull(_) => "pull",
            Self::Install(_) => "install",
            Self::Diff(_) => "diff",
            Self::Version => "version",
        }
    }
}

/// Options for the `push` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct PushOpts {
    /// Commit message
    #[arg(short, long, default_value = DEFAULT_COMMIT_MESSAGE)]
    pub message: String,

    /// Push only this target
    #[arg(short, long)]
    pub target: Option<String>,
}

/// Options for the `pull` subcommand.
#[derive(Parser, Debug, Clone, Default)]
pub struct PullOpts {
    /// Pull only this target
    #[arg(short, long)]
    pub target: Option<String>,
}

/// Options for subcommands that act on one environment.
#[derive(Parser, Debug, Clone)]
pub struct EnvOpts {
    /// Environment name from the config file
    pub environment: String,
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::panic
)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_status() {
        let cli = Cli::parse_from(["kitchen-sync", "status"]);
        assert!(matches!(cli.command, Command::Status));
        assert!(!cli.verbose);
        assert!(!cli.global.dry_run);
        assert_eq!(cli.command.name(), "status");
    }

    #[test]
    fn parse_push_defaults_message() {
        let cli = Cli::parse_from(["kitchen-sync", "push"]);
        let Command::Push(opts) = cli.command else {
            panic!("expected push");
        };
        assert_eq!(opts.message, DEFAULT_COMMIT_MESSAGE);
        assert_eq!(opts.target, None);
    }

    #[test]
    fn parse_push_with_message_and_target() {
        let cli = Cli::parse_from(["kitchen-sync", "push", "-m", "tweak prompts", "-t", "claude"]);
        let Command::Push(opts) = cli.command else {
            panic!("expected push");
        };
        assert_eq!(opts.message, "tweak prompts");
        assert_eq!(opts.target.as_deref(), Some("claude"));
    }

    #[test]
    fn parse_pull_target_long() {
        let cli = Cli::parse_from(["kitchen-sync", "pull", "--target", "cursor"]);
        let Command::Pull(opts) = cli.command else {
            panic!("expected pull");
        };
        assert_eq!(opts.target.as_deref(), Some("cursor"));
    }

    #[test]
    fn parse_install_environment() {
        let cli = Cli::parse_from(["kitchen-sync", "install", "devbox", "--dry-run"]);
        assert!(cli.global.dry_run);
        let Command::Install(opts) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(opts.environment, "devbox");
    }

    #[test]
    fn install_requires_environment() {
        assert!(Cli::try_parse_from(["kitchen-sync", "install"]).is_err());
    }

    #[test]
    fn parse_diff_with_global_flags_before_subcommand() {
        let cli = Cli::parse_from([
            "kitchen-sync",
            "-v",
            "-d",
            "--config",
            "/tmp/ks.toml",
            "diff",
            "server",
        ]);
        assert!(cli.verbose);
        assert!(cli.global.dry_run);
        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/ks.toml")));
        assert_eq!(cli.command.name(), "diff");
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["kitchen-sync", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn unknown_subcommand_is_error() {
        assert!(Cli::try_parse_from(["kitchen-sync", "init"]).is_err());
    }
}
