//! Depth-first directory traversal.
//!
//! Explicit `fs::read_dir` recursion rather than a generic walker: the run
//! counters require each successfully opened directory to be counted exactly
//! once, and an unreadable directory to be skipped silently without a count.

use crate::config::ScanConfig;
use crate::ignore::IgnoreMatcher;
use crate::verdict::RunStats;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::trace;

/// A file selected for scanning.
#[derive(Debug, Clone)]
pub struct ScanCandidate {
    pub path: PathBuf,
    /// Lowercased suffix after the final dot, dot included.
    pub extension: Option<String>,
    pub is_symlink: bool,
}

pub struct Walker<'a> {
    config: &'a ScanConfig,
    ignore: IgnoreMatcher,
}

/// Lowercased suffix after the final `.`, dot included. A name without a dot
/// has no extension.
fn extension_of(name: &str) -> Option<String> {
    name.rfind('.').map(|idx| name[idx..].to_lowercase())
}

impl<'a> Walker<'a> {
    pub fn new(config: &'a ScanConfig, ignore: IgnoreMatcher) -> Self {
        Self { config, ignore }
    }

    fn wants_extension(&self, extension: Option<&str>) -> bool {
        if self.config.scan_everything {
            return true;
        }
        extension.is_some_and(|ext| self.config.extensions.iter().any(|e| e == ext))
    }

    /// Walk `dir` depth-first, pre-order, invoking `visit` for every
    /// selected candidate before moving to the next entry.
    pub fn walk(
        &self,
        dir: &Path,
        stats: &mut RunStats,
        visit: &mut dyn FnMut(&mut RunStats, ScanCandidate),
    ) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                trace!(path = %dir.display(), error = %e, "Skipping unreadable directory");
                return;
            }
        };
        stats.directories_visited += 1;

        for entry in entries.flatten() {
            let path = entry.path();
            if self.ignore.is_ignored(&path.to_string_lossy()) {
                trace!(path = %path.display(), "Ignored by rule");
                continue;
            }

            let is_symlink = path
                .symlink_metadata()
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false);
            if is_symlink && !self.config.follow_symlinks {
                trace!(path = %path.display(), "Skipping symlink");
                continue;
            }

            if path.is_dir() {
                self.walk(&path, stats, visit);
            } else if path.is_file() {
                let extension = entry
                    .file_name()
                    .to_str()
                    .and_then(extension_of);
                if self.wants_extension(extension.as_deref()) {
                    visit(
                        stats,
                        ScanCandidate {
                            path,
                            extension,
                            is_symlink,
                        },
                    );
                }
            }
        }
    }
}
