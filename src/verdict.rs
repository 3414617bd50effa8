//! Scan verdicts and per-run counters.

use serde::{Deserialize, Serialize};

/// Terminal state of a scanned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Clean,
    Infected,
    Whitelisted,
}

impl FileStatus {
    /// Two-letter status code used in report lines.
    pub fn code(&self) -> &'static str {
        match self {
            FileStatus::Clean => "OK",
            FileStatus::Infected => "ER",
            FileStatus::Whitelisted => "WL",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A single signature hit inside a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub pattern: String,
    pub comment: String,
    /// 1-based line of the match offset. Only populated when line-number
    /// reporting is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,
}

/// The outcome of scanning one file.
///
/// A clean or whitelisted file produces exactly one verdict with no match
/// record. An infected file produces one verdict per match record: a single
/// one under stop-on-first-match, possibly several under no-stop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub path: String,
    pub status: FileStatus,
    pub content_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<MatchRecord>,
}

impl Verdict {
    pub fn clean(path: String, content_hash: String) -> Self {
        Self {
            path,
            status: FileStatus::Clean,
            content_hash,
            matched: None,
        }
    }

    pub fn whitelisted(path: String, content_hash: String) -> Self {
        Self {
            path,
            status: FileStatus::Whitelisted,
            content_hash,
            matched: None,
        }
    }

    pub fn infected(path: String, content_hash: String, matched: MatchRecord) -> Self {
        Self {
            path,
            status: FileStatus::Infected,
            content_hash,
            matched: Some(matched),
        }
    }
}

/// Counters scoped to a single scan invocation.
///
/// Owned by the run and returned to the caller; repeated invocations never
/// share state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub directories_visited: u64,
    pub files_scanned: u64,
    pub files_infected: u64,
}
