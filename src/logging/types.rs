//! Summary entries recorded by the command layer.

/// Outcome of one unit of work (a target, or a target in an environment).
#[derive(Debug, Clone)]
pub struct SummaryEntry {
    /// What was processed, e.g. `claude` or `claude → devbox`.
    pub name: String,
    /// How it ended.
    pub outcome: Outcome,
    /// Optional detail (skip reason, error description).
    pub message: Option<String>,
}

/// How a unit of work ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Completed and applied its changes.
    Ok,
    /// Not attempted (directory missing, environment has no mapping, ...).
    Skipped,
    /// Ran in dry-run mode; nothing was changed.
    DryRun,
    /// Hit an error; later units still ran.
    Failed,
}
