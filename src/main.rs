use anyhow::Result;
use clap::Parser;
use std::io::Write as _;

use kitchen_sync::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();

    if matches!(args.command, cli::Command::Version) {
        let version = option_env!("KITCHEN_SYNC_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
        writeln!(std::io::stdout(), "kitchen-sync {version}")?;
        return Ok(());
    }

    logging::init_subscriber(args.verbose, args.command.name());
    let log = logging::Logger::new(args.command.name());

    let result = match &args.command {
        cli::Command::Status => commands::status::run(&args.global, &log),
        cli::Command::Push(opts) => commands::push::run(&args.global, opts, &log),
        cli::Command::Pull(opts) => commands::pull::run(&args.global, opts, &log),
        cli::Command::Install(opts) => commands::install::run(&args.global, opts, &log),
        cli::Command::Diff(opts) => commands::diff::run(&args.global, opts, &log),
        cli::Command::Version => Ok(()),
    };

    if result.is_err()
        && let Some(path) = log.log_path()
    {
        log.info(&format!("log: {}", path.display()));
    }
    result
}
