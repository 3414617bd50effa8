//! Signature-based malware scanner for web file trees.
//!
//! The core walks directory trees depth-first, hashes every selected file,
//! consults a two-tier content-hash whitelist, and runs ordered multi-mode
//! signature matching over everything the whitelist does not exempt. The
//! scan is fully single-threaded and synchronous; the per-run counters are
//! returned to the caller, never held in global state.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod ignore;
pub mod reporter;
pub mod signatures;
pub mod verdict;
pub mod walk;
pub mod whitelist;

pub use cli::{Cli, OutputFormat};
pub use config::ScanConfig;
pub use engine::{ScanEngine, run_scan};
pub use error::{MalscanError, Result};
pub use ignore::IgnoreMatcher;
pub use reporter::{JsonReporter, OutputOptions, Reporter, RunSummary, TerminalReporter};
pub use signatures::{MatchKind, Signature, SignatureSet, SignatureStore};
pub use verdict::{FileStatus, MatchRecord, RunStats, Verdict};
pub use walk::{ScanCandidate, Walker};
pub use whitelist::{IntegrityPolicy, WhitelistIndex};
