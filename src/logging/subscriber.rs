//! The global subscriber: a coloured console layer plus a plain log file.
use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::sync::Mutex;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Metadata};

use super::utils::{log_file_path, plain_text};

/// Target of stage-header events.
pub(super) const STAGE_TARGET: &str = "kitchen_sync::stage";
/// Target of dry-run events.
pub(super) const DRY_RUN_TARGET: &str = "kitchen_sync::dry_run";

/// How an event is presented, independent of where it is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn of(metadata: &Metadata<'_>) -> Self {
        match (*metadata.level(), metadata.target()) {
            (Level::ERROR, _) => Self::Error,
            (Level::WARN, _) => Self::Warn,
            (Level::INFO, STAGE_TARGET) => Self::Stage,
            (Level::INFO, DRY_RUN_TARGET) => Self::DryRun,
            (Level::INFO, _) => Self::Info,
            _ => Self::Debug,
        }
    }

    fn console(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::DryRun => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            Self::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }

    fn file(self, target: &str, msg: &str) -> String {
        match self {
            Self::Stage => format!("==> {msg}"),
            Self::DryRun => format!("  dry-run: {msg}"),
            Self::Error => format!("  error: {msg}"),
            Self::Warn => format!("  warn: {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  debug {target}: {msg}"),
        }
    }
}

/// The `message` field of an event.
#[derive(Default)]
struct Message(String);

impl Visit for Message {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.0);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

fn message_of(event: &Event<'_>) -> String {
    let mut message = Message::default();
    event.record(&mut message);
    message.0
}

/// Appends events to `<cache>/kitchen-sync/<command>.log` without colour.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<File>,
}

impl FileLayer {
    /// Start a fresh log for `command`. `None` when the file cannot be opened.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version = option_env!("KITCHEN_SYNC_VERSION")
            .unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let started = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .ok()?;
        writeln!(file, "# kitchen-sync {version}: {command} started {started}").ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let metadata = event.metadata();
        let body = Kind::of(metadata).file(metadata.target(), &plain_text(&message_of(event)));
        let at = chrono::Utc::now().format("%H:%M:%S");
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{at} {body}").ok();
        }
    }
}

struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let line = Kind::of(event.metadata()).console(&message_of(event));
        writeln!(writer, "{line}")
    }
}

/// Install the process-wide subscriber. Call once, before logging anything.
///
/// The console gets `INFO` and up (`DEBUG` with `verbose`), with warnings
/// and errors on stderr. The log file for `command` always gets `DEBUG`.
pub fn init_subscriber(verbose: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .and(std::io::stdout.with_min_level(Level::INFO));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .event_format(ConsoleFormatter)
                .with_writer(writer)
                .with_filter(console_level),
        )
        .with(FileLayer::new(command).map(|layer| layer.with_filter(LevelFilter::DEBUG)))
        .init();
}
