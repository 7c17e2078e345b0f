//! Command-level logger with dry-run markers and a per-target summary.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Outcome, SummaryEntry};
use super::utils::log_file_path;

/// Logger handed to every command.
///
/// Messages go through [`tracing`], so they reach both the console and the
/// log file installed by [`init_subscriber`](super::init_subscriber).
/// Outcomes recorded with [`record`](Self::record) are printed by
/// [`print_summary`](Self::print_summary).
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<SummaryEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger for `command`. Does not touch the log file; the
    /// subscriber owns it.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
        }
    }

    /// Path of the log file, if the cache directory is usable.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (console only with `--verbose`, always in the
    /// log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log an action that dry-run mode skipped.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record the outcome of one unit of work for the summary.
    pub fn record(&self, name: &str, outcome: Outcome, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(SummaryEntry {
                name: name.to_string(),
                outcome,
                message: message.map(String::from),
            });
        }
    }

    /// All recorded entries, in order.
    #[must_use]
    pub fn entries(&self) -> Vec<SummaryEntry> {
        self.entries.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Number of entries recorded as [`Outcome::Failed`].
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.entries.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|e| e.outcome == Outcome::Failed)
                .count()
        })
    }

    /// Print one line per recorded entry plus totals.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }

        self.stage("Summary");

        let (mut ok, mut skipped, mut dry_run, mut failed) = (0u32, 0u32, 0u32, 0u32);
        for entry in &entries {
            let (icon, color) = match entry.outcome {
                Outcome::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                Outcome::Skipped => {
                    skipped += 1;
                    ("○", "\x1b[33m")
                }
                Outcome::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                Outcome::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
            };
            let suffix = entry
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));
            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", entry.name));
        }

        self.info(&format!(
            "{} total: \x1b[32m{ok} ok\x1b[0m, \x1b[33m{skipped} skipped\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m",
            entries.len()
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}
