//! Error types for malscan.
//!
//! Per-file and per-directory I/O problems are recovered locally during a
//! scan (an unreadable file scans as empty, an unreadable directory is
//! skipped) and never surface here. The variants below are the fatal cases:
//! invalid configuration, remote fetch failures, and archive integrity
//! violations under the strict policy.

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all malscan operations.
#[derive(Error, Debug)]
pub enum MalscanError {
    /// Invalid configuration (no scan roots, a root that is not a
    /// directory, a malformed ignore rule).
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed on a file malscan itself manages, such as the
    /// combined whitelist cache.
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        path: PathBuf,
        operation: IoOperation,
        #[source]
        source: std::io::Error,
    },

    /// Regex compilation error.
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// Network failure while fetching the combined whitelist or the
    /// WordPress checksum feed. Always fatal: whitelist completeness
    /// cannot be guaranteed, so the run aborts before any file is scanned.
    #[error("Failed to fetch {url}: {source}")]
    RemoteFetch {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Downloaded combined whitelist archive does not hash to the expected
    /// digest. Only raised under `IntegrityPolicy::Strict`.
    #[error("Combined whitelist digest mismatch: expected {expected}, got {actual}")]
    Integrity { expected: String, actual: String },

    /// The combined whitelist archive could not be decoded.
    #[error("Invalid combined whitelist archive: {0}")]
    InvalidArchive(String),

    /// The WordPress checksum API returned no checksums for the requested
    /// version.
    #[error("No checksums returned for WordPress version {0}")]
    ChecksumFeed(String),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MalscanError {
    /// Create an I/O read error.
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: IoOperation::Read,
            source,
        }
    }

    /// Create an I/O write error.
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: IoOperation::Write,
            source,
        }
    }
}

/// I/O operation types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOperation {
    Read,
    Write,
}

impl std::fmt::Display for IoOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Result type alias for malscan operations.
pub type Result<T> = std::result::Result<T, MalscanError>;
