//! Verdict rendering.
//!
//! Reporters receive verdicts as the walk produces them and a summary once
//! the run completes. The core never formats output itself.

pub mod json;
pub mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::verdict::{RunStats, Verdict};
use std::path::PathBuf;
use std::time::SystemTime;

/// Timing and target context for the end-of-run summary.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
    pub roots: Vec<PathBuf>,
}

/// Presentation options, constructed by the CLI layer.
#[derive(Debug, Clone, Default)]
pub struct OutputOptions {
    pub show_checksum: bool,
    pub show_comments: bool,
    pub show_patterns: bool,
    pub show_time: bool,
    pub show_line_numbers: bool,
    pub hide_ok: bool,
    pub hide_err: bool,
    pub hide_whitelist: bool,
    /// Custom template with `%S %T %M %F %P %C %L` placeholders. Bypasses
    /// coloring entirely.
    pub output_format: Option<String>,
    pub disable_stats: bool,
}

pub trait Reporter {
    /// Render the verdicts of one scanned file.
    fn file_verdicts(&mut self, verdicts: &[Verdict]);

    /// Render the end-of-run summary.
    fn summary(&mut self, stats: &RunStats, run: &RunSummary);
}
