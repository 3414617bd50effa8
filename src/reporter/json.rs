//! JSON report for machine consumers.

use crate::reporter::{Reporter, RunSummary};
use crate::verdict::{RunStats, Verdict};
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    started_at: String,
    finished_at: String,
    targets: Vec<String>,
    stats: &'a RunStats,
    verdicts: &'a [Verdict],
}

/// Buffers verdicts and emits one JSON document at the end of the run.
#[derive(Debug, Default)]
pub struct JsonReporter {
    verdicts: Vec<Verdict>,
}

impl JsonReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn render(&self, stats: &RunStats, run: &RunSummary) -> String {
        let report = JsonReport {
            version: env!("CARGO_PKG_VERSION"),
            started_at: DateTime::<Local>::from(run.started_at).to_rfc3339(),
            finished_at: DateTime::<Local>::from(run.finished_at).to_rfc3339(),
            targets: run.roots.iter().map(|r| r.display().to_string()).collect(),
            stats,
            verdicts: &self.verdicts,
        };
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Reporter for JsonReporter {
    fn file_verdicts(&mut self, verdicts: &[Verdict]) {
        self.verdicts.extend_from_slice(verdicts);
    }

    fn summary(&mut self, stats: &RunStats, run: &RunSummary) {
        println!("{}", self.render(stats, run));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{FileStatus, MatchRecord};
    use std::path::PathBuf;
    use std::time::SystemTime;

    #[test]
    fn test_render_includes_verdicts_and_stats() {
        let mut reporter = JsonReporter::new();
        reporter.file_verdicts(&[Verdict::infected(
            "/site/bad.php".into(),
            "0123456789abcdef0123456789abcdef".into(),
            MatchRecord {
                pattern: "eval(".into(),
                comment: "loader".into(),
                line_number: None,
            },
        )]);

        let stats = RunStats {
            directories_visited: 1,
            files_scanned: 1,
            files_infected: 1,
        };
        let run = RunSummary {
            started_at: SystemTime::now(),
            finished_at: SystemTime::now(),
            roots: vec![PathBuf::from("/site")],
        };

        let rendered = reporter.render(&stats, &run);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["stats"]["files_infected"], 1);
        assert_eq!(parsed["verdicts"][0]["status"], "infected");
        assert_eq!(parsed["targets"][0], "/site");
    }

    #[test]
    fn test_verdicts_accumulate_across_files() {
        let mut reporter = JsonReporter::new();
        reporter.file_verdicts(&[Verdict::clean("/a.php".into(), "0".repeat(32))]);
        reporter.file_verdicts(&[Verdict::clean("/b.php".into(), "1".repeat(32))]);
        assert_eq!(reporter.verdicts.len(), 2);
        assert!(reporter
            .verdicts
            .iter()
            .all(|v| v.status == FileStatus::Clean));
    }
}
