//! Scan configuration consumed by the core.
//!
//! Constructed by the CLI layer; the core only sees this struct.

use crate::error::{MalscanError, Result};
use crate::whitelist::IntegrityPolicy;
use std::path::PathBuf;

/// Canonical base URL of the combined whitelist distribution.
pub const DEFAULT_COMBINED_BASE_URL: &str = "https://scr34m.github.io/php-malware-scanner";

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directories to walk.
    pub roots: Vec<PathBuf>,
    /// Extension allow-list, normalized to lowercase with a leading dot.
    pub extensions: Vec<String>,
    /// Glob-style ignore rules over full paths, in configured order.
    pub ignore_rules: Vec<String>,
    /// Scan all files regardless of extension.
    pub scan_everything: bool,
    /// Use the two-tier base64 signature sets instead of the standard three.
    pub base64_mode: bool,
    /// Append the synthetic bot/htaccess sentinel signatures.
    pub extra_checks: bool,
    /// Descend into symlinked entries.
    pub follow_symlinks: bool,
    /// Terminate a file's scan at its first signature match (default).
    pub stop_on_first_match: bool,
    /// Compute 1-based line numbers for match records.
    pub line_numbers: bool,
    /// Enable the combined whitelist tier.
    pub combined_whitelist: bool,
    /// Whitelist files loaded into the local tier, in order.
    pub whitelist_files: Vec<PathBuf>,
    /// WordPress core version whose checksums are added to the whitelist.
    pub wordpress_version: Option<String>,
    /// Archive digest mismatch handling.
    pub integrity_policy: IntegrityPolicy,
    /// Directory holding the standard three definition files.
    pub definitions_dir: PathBuf,
    /// Directory holding the two base64 definition files.
    pub base64_dir: PathBuf,
    /// Combined whitelist distribution base URL.
    pub combined_base_url: String,
    /// Cache file for the downloaded combined archive.
    pub combined_cache_path: PathBuf,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            extensions: vec![".php".to_string()],
            ignore_rules: Vec::new(),
            scan_everything: false,
            base64_mode: false,
            extra_checks: false,
            follow_symlinks: false,
            stop_on_first_match: true,
            line_numbers: false,
            combined_whitelist: false,
            whitelist_files: vec![PathBuf::from("whitelist.txt")],
            wordpress_version: None,
            integrity_policy: IntegrityPolicy::Lenient,
            definitions_dir: PathBuf::from("definitions"),
            base64_dir: PathBuf::from("base64_patterns"),
            combined_base_url: DEFAULT_COMBINED_BASE_URL.to_string(),
            combined_cache_path: PathBuf::from("whitelist.dat"),
        }
    }
}

impl ScanConfig {
    /// Replace the extension allow-list, normalizing each entry to
    /// lowercase with a leading dot.
    pub fn set_extensions(&mut self, extensions: &[String]) {
        self.extensions = extensions
            .iter()
            .map(|ext| {
                let ext = ext.to_lowercase();
                if ext.starts_with('.') {
                    ext
                } else {
                    format!(".{ext}")
                }
            })
            .collect();
    }

    /// Fatal pre-walk validation: at least one root, every root a directory.
    pub fn validate(&self) -> Result<()> {
        if self.roots.is_empty() {
            return Err(MalscanError::Config(
                "no directory specified or directory doesn't exist".to_string(),
            ));
        }
        for root in &self.roots {
            if !root.is_dir() {
                return Err(MalscanError::Config(format!(
                    "specified path is not a directory: {}",
                    root.display()
                )));
            }
        }
        Ok(())
    }
}
