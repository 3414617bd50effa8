//! Signature definition loading.
//!
//! Definition files are plain text, one file per matching kind. Blank lines
//! are skipped; a line whose first character is `#` replaces the "current
//! comment" and is not itself a pattern; every other line is trimmed and
//! recorded as a signature carrying the current comment. A missing or
//! unreadable file yields an empty set: coverage for that kind degrades
//! silently rather than aborting the run.

use regex::bytes::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// How a signature pattern is matched against file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Byte-exact substring search.
    RawExact,
    /// ASCII-case-folded substring search.
    RawCaseInsensitive,
    /// Regular expression with multiline + case-insensitive semantics.
    Regex,
}

/// A single malicious-code signature with its attached comment.
#[derive(Debug, Clone)]
pub struct Signature {
    pub pattern: String,
    pub kind: MatchKind,
    pub comment: String,
    /// Compiled form, present only for `MatchKind::Regex`.
    pub regex: Option<Regex>,
}

/// Ordered sequence of signatures of one kind.
///
/// Iteration order is source-file order. A duplicate pattern updates the
/// comment of the existing record in place; the record keeps the position of
/// its first occurrence.
#[derive(Debug, Clone, Default)]
pub struct SignatureSet {
    pub kind: Option<MatchKind>,
    entries: Vec<Signature>,
}

impl SignatureSet {
    pub fn new(kind: MatchKind) -> Self {
        Self {
            kind: Some(kind),
            entries: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Signature> {
        self.entries.iter()
    }

    /// Record a pattern with the current comment, resolving duplicates
    /// in place.
    pub fn push(&mut self, pattern: &str, kind: MatchKind, comment: &str) {
        if let Some(existing) = self.entries.iter_mut().find(|s| s.pattern == pattern) {
            existing.comment = comment.to_string();
            return;
        }

        let regex = match kind {
            MatchKind::Regex => {
                // `(?im)`: `^`/`$` match line boundaries and letter case is
                // ignored, mirroring the reference matcher semantics.
                match Regex::new(&format!("(?im){pattern}")) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        warn!(pattern, error = %e, "Skipping unparseable regex signature");
                        return;
                    }
                }
            }
            _ => None,
        };

        self.entries.push(Signature {
            pattern: pattern.to_string(),
            kind,
            comment: comment.to_string(),
            regex,
        });
    }

    /// Load one definition file. Missing or unreadable files produce an
    /// empty set.
    pub fn load(path: &Path, kind: MatchKind) -> Self {
        let mut set = Self::new(kind);
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Definition file not readable");
                return set;
            }
        };

        let mut comment = String::new();
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if line.starts_with('#') {
                comment = line[1..].trim().to_string();
                continue;
            }
            set.push(trimmed, kind, &comment);
        }

        debug!(path = %path.display(), count = set.len(), "Loaded signature set");
        set
    }
}

/// All signature sets for one scan, partitioned by matching kind and kept in
/// the strict group order the engine runs them in.
#[derive(Debug, Clone, Default)]
pub struct SignatureStore {
    groups: Vec<SignatureSet>,
}

impl SignatureStore {
    /// Load the three-tier default store: raw, case-insensitive raw, regex.
    pub fn load_standard(definitions_dir: &Path) -> Self {
        Self {
            groups: vec![
                SignatureSet::load(&definitions_dir.join("patterns_raw.txt"), MatchKind::RawExact),
                SignatureSet::load(
                    &definitions_dir.join("patterns_iraw.txt"),
                    MatchKind::RawCaseInsensitive,
                ),
                SignatureSet::load(&definitions_dir.join("patterns_re.txt"), MatchKind::Regex),
            ],
        }
    }

    /// Load the two-tier base64 store: obfuscated function names and
    /// keywords, both matched byte-exactly.
    pub fn load_base64(base64_dir: &Path) -> Self {
        Self {
            groups: vec![
                SignatureSet::load(&base64_dir.join("php_functions.txt"), MatchKind::RawExact),
                SignatureSet::load(&base64_dir.join("php_keywords.txt"), MatchKind::RawExact),
            ],
        }
    }

    /// Append the two synthetic bot/htaccess sentinel signatures to the
    /// first raw group.
    pub fn apply_extra_checks(&mut self) {
        if let Some(raw) = self.groups.first_mut() {
            raw.push("googleBot", MatchKind::RawExact, "");
            raw.push("htaccess", MatchKind::RawExact, "");
        }
    }

    pub fn groups(&self) -> &[SignatureSet] {
        &self.groups
    }

    pub fn total_signatures(&self) -> usize {
        self.groups.iter().map(SignatureSet::len).sum()
    }
}
