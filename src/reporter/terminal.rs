//! Colored line-per-verdict terminal output.
//!
//! The default line format mirrors the reference scanner: a status code,
//! optional change time and checksum columns, the path wrapped in `# {...}`
//! so pasted output is never a runnable shell command, and optional pattern,
//! comment, and line-number columns for matches. A custom `--output-format`
//! template replaces the default assembly and is rendered without color.

use crate::reporter::{OutputOptions, Reporter, RunSummary};
use crate::verdict::{FileStatus, RunStats, Verdict};
use chrono::{DateTime, Local};
use colored::{ColoredString, Colorize};
use std::path::Path;
use std::time::SystemTime;

pub struct TerminalReporter {
    opts: OutputOptions,
}

fn format_timestamp(ts: SystemTime) -> String {
    DateTime::<Local>::from(ts)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Change time of a path in the reference `H:i d-m-Y` layout.
fn change_time(path: &str) -> String {
    let meta = match std::fs::metadata(Path::new(path)) {
        Ok(meta) => meta,
        Err(_) => return String::new(),
    };

    #[cfg(unix)]
    let ts = {
        use std::os::unix::fs::MetadataExt;
        DateTime::from_timestamp(meta.ctime(), 0).map(|dt| dt.with_timezone(&Local))
    };
    #[cfg(not(unix))]
    let ts = meta.modified().ok().map(DateTime::<Local>::from);

    ts.map(|dt| dt.format("%H:%M %d-%m-%Y").to_string())
        .unwrap_or_default()
}

impl TerminalReporter {
    pub fn new(opts: OutputOptions) -> Self {
        Self { opts }
    }

    fn state_color(&self, status: FileStatus, text: &str) -> ColoredString {
        match status {
            FileStatus::Clean => text.green(),
            FileStatus::Infected => text.red(),
            FileStatus::Whitelisted => text.yellow(),
        }
    }

    /// Assemble the default template from the active display flags.
    fn default_format(&self, status: FileStatus) -> String {
        let mut format = String::from("%S ");
        if self.opts.show_time {
            format.push_str("%T");
        }
        if self.opts.show_checksum {
            format.push_str("%M ");
        }
        format.push_str("# {%F} ");
        if status == FileStatus::Infected {
            if self.opts.show_patterns {
                format.push_str("%P ");
            }
            if self.opts.show_comments {
                format.push_str("%C ");
            }
            if self.opts.show_line_numbers {
                format.push_str("# %L");
            }
        }
        format.trim_end().to_string()
    }

    fn format_verdict(&self, verdict: &Verdict) -> Option<String> {
        let hidden = match verdict.status {
            FileStatus::Clean => self.opts.hide_ok,
            FileStatus::Infected => self.opts.hide_err,
            FileStatus::Whitelisted => self.opts.hide_whitelist,
        };
        if hidden {
            return None;
        }

        // Clean files print a blank checksum column.
        let hash = if verdict.status == FileStatus::Clean {
            " ".repeat(32)
        } else {
            verdict.content_hash.clone()
        };
        let ctime = if self.opts.show_time {
            change_time(&verdict.path)
        } else {
            String::new()
        };
        let (pattern, comment, line) = match &verdict.matched {
            Some(record) => (
                record.pattern.clone(),
                record.comment.clone(),
                record.line_number.unwrap_or(0),
            ),
            None => (String::new(), String::new(), 0),
        };

        let line = line.to_string();
        let rendered = match &self.opts.output_format {
            Some(custom) => custom
                .replace("%S", verdict.status.code())
                .replace("%T", &ctime)
                .replace("%M", &hash)
                .replace("%F", &verdict.path)
                .replace("%P", &pattern)
                .replace("%C", &comment)
                .replace("%L", &line),
            None => {
                let status = self
                    .state_color(verdict.status, &format!("# {}", verdict.status.code()))
                    .to_string();
                let marked_pattern = self
                    .state_color(verdict.status, &format!("#{pattern}"))
                    .to_string();
                self.default_format(verdict.status)
                    .replace("%S", &status)
                    .replace("%T", &ctime.cyan().to_string())
                    .replace("%M", &hash.cyan().to_string())
                    .replace("%F", &verdict.path)
                    .replace("%P", &marked_pattern)
                    .replace("%C", &comment.cyan().to_string())
                    .replace("%L", &line)
            }
        };
        Some(rendered)
    }
}

impl Reporter for TerminalReporter {
    fn file_verdicts(&mut self, verdicts: &[Verdict]) {
        for verdict in verdicts {
            if let Some(line) = self.format_verdict(verdict) {
                println!("{line}");
            }
        }
    }

    fn summary(&mut self, stats: &RunStats, run: &RunSummary) {
        if self.opts.disable_stats {
            return;
        }

        let elapsed = run
            .finished_at
            .duration_since(run.started_at)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let roots = run
            .roots
            .iter()
            .map(|r| r.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");

        println!("Start time: {}", format_timestamp(run.started_at));
        println!("End time: {}", format_timestamp(run.finished_at));
        println!("Total execution time: {elapsed}");
        println!("Base directory: {roots}");
        println!("Total directories scanned: {}", stats.directories_visited);
        println!("Total files scanned: {}", stats.files_scanned);
        println!("Total malware identified: {}", stats.files_infected);
    }
}
