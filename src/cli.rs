//! Command-line surface.
//!
//! Pure glue: flags map onto `ScanConfig` (consumed by the core) and
//! `OutputOptions` (consumed by the reporter). No decision logic lives here.

use crate::config::ScanConfig;
use crate::reporter::OutputOptions;
use crate::whitelist::IntegrityPolicy;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

#[derive(Parser, Debug)]
#[command(
    name = "malscan",
    version,
    about = "Signature-based malware scanner for web file trees",
    long_about = "malscan walks one or more directory trees and checks every selected file \
                  against ordered malicious-code signatures, suppressing known-good files \
                  via a content-hash whitelist."
)]
pub struct Cli {
    /// Directories to scan
    #[arg(value_name = "DIR")]
    pub paths: Vec<PathBuf>,

    /// Directory to scan (repeatable, same as positional DIR)
    #[arg(short = 'd', long = "directory", value_name = "DIR")]
    pub directory: Vec<PathBuf>,

    /// File extension to scan, repeatable (default: php)
    #[arg(short = 'e', long = "extension", value_name = "EXT")]
    pub extension: Vec<String>,

    /// Glob-style path to ignore, repeatable
    #[arg(short = 'i', long = "ignore", value_name = "GLOB")]
    pub ignore: Vec<String>,

    /// Enable --checksum, --comment, --pattern and --time at once
    #[arg(short = 'a', long = "all-output")]
    pub all_output: bool,

    /// Scan for base64-obfuscated PHP keywords instead of the standard sets
    #[arg(short = 'b', long = "base64")]
    pub base64: bool,

    /// Display the MD5 checksum of each file
    #[arg(short = 'm', long = "checksum")]
    pub checksum: bool,

    /// Display the comment attached to matched patterns
    #[arg(short = 'c', long = "comment")]
    pub comment: bool,

    /// Add the googleBot and htaccess sentinels to the scan list
    #[arg(short = 'x', long = "extra-check")]
    pub extra_check: bool,

    /// Follow symlinked directories and files
    #[arg(short = 'l', long = "follow-symlink")]
    pub follow_symlink: bool,

    /// Hide results with OK status
    #[arg(short = 'k', long = "hide-ok")]
    pub hide_ok: bool,

    /// Hide results with ER status
    #[arg(short = 'r', long = "hide-err")]
    pub hide_err: bool,

    /// Hide results with WL status
    #[arg(short = 'w', long = "hide-whitelist")]
    pub hide_whitelist: bool,

    /// Disable color output
    #[arg(short = 'n', long = "no-color")]
    pub no_color: bool,

    /// Continue scanning a file after its first match
    #[arg(short = 's', long = "no-stop")]
    pub no_stop: bool,

    /// Show the matched pattern next to the file name
    #[arg(short = 'p', long = "pattern")]
    pub pattern: bool,

    /// Show the time of last file change
    #[arg(short = 't', long = "time")]
    pub time: bool,

    /// Display the matching line number in the file
    #[arg(short = 'L', long = "line-number")]
    pub line_number: bool,

    /// Custom output template (%S %T %M %F %P %C %L)
    #[arg(short = 'o', long = "output-format", value_name = "TEMPLATE")]
    pub output_format: Option<String>,

    /// WordPress version whose core checksums are whitelisted
    #[arg(short = 'j', long = "wordpress-version", value_name = "VERSION")]
    pub wordpress_version: Option<String>,

    /// Scan all files, with or without extensions
    #[arg(short = 'E', long = "scan-everything")]
    pub scan_everything: bool,

    /// Enable the combined whitelist archive
    #[arg(long = "combined-whitelist")]
    pub combined_whitelist: bool,

    /// Abort when the combined whitelist archive fails integrity checking
    #[arg(long = "strict-integrity")]
    pub strict_integrity: bool,

    /// Additional whitelist file, repeatable
    #[arg(long = "custom-whitelist", value_name = "FILE")]
    pub custom_whitelist: Vec<PathBuf>,

    /// Disable the statistics summary
    #[arg(long = "disable-stats")]
    pub disable_stats: bool,

    /// Directory holding the standard definition files
    #[arg(long = "definitions", value_name = "DIR")]
    pub definitions: Option<PathBuf>,

    /// Directory holding the base64 definition files
    #[arg(long = "base64-patterns", value_name = "DIR")]
    pub base64_patterns: Option<PathBuf>,

    /// Combined whitelist distribution base URL
    #[arg(long = "whitelist-url", value_name = "URL")]
    pub whitelist_url: Option<String>,

    /// Cache file for the downloaded combined archive
    #[arg(long = "cache-file", value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Verbose diagnostics on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Build the core configuration.
    pub fn scan_config(&self) -> ScanConfig {
        let mut config = ScanConfig::default();

        config.roots = self
            .paths
            .iter()
            .chain(self.directory.iter())
            .cloned()
            .collect();
        if !self.extension.is_empty() {
            config.set_extensions(&self.extension);
        }
        config.ignore_rules = self.ignore.clone();
        config.scan_everything = self.scan_everything;
        config.base64_mode = self.base64;
        config.extra_checks = self.extra_check;
        config.follow_symlinks = self.follow_symlink;
        config.stop_on_first_match = !self.no_stop;
        config.line_numbers = self.line_number;
        config.combined_whitelist = self.combined_whitelist;
        config.wordpress_version = self.wordpress_version.clone();
        if self.strict_integrity {
            config.integrity_policy = IntegrityPolicy::Strict;
        }

        // Default whitelist file first, then custom files, duplicates
        // dropped while preserving order.
        for file in &self.custom_whitelist {
            if !config.whitelist_files.contains(file) {
                config.whitelist_files.push(file.clone());
            }
        }

        if let Some(dir) = &self.definitions {
            config.definitions_dir = dir.clone();
        }
        if let Some(dir) = &self.base64_patterns {
            config.base64_dir = dir.clone();
        }
        if let Some(url) = &self.whitelist_url {
            config.combined_base_url = url.clone();
        }
        if let Some(file) = &self.cache_file {
            config.combined_cache_path = file.clone();
        }

        config
    }

    /// Build the reporter presentation options.
    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            show_checksum: self.checksum || self.all_output,
            show_comments: self.comment || self.all_output,
            show_patterns: self.pattern || self.all_output,
            show_time: self.time || self.all_output,
            show_line_numbers: self.line_number,
            hide_ok: self.hide_ok,
            hide_err: self.hide_err,
            hide_whitelist: self.hide_whitelist,
            output_format: self.output_format.clone(),
            disable_stats: self.disable_stats,
        }
    }
}
