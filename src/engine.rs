//! Per-file matching engine and the top-level scan run.
//!
//! Each candidate goes through a fixed state machine: count it, read the
//! whole file, hash eagerly, consult the whitelist, and only then run the
//! signature groups in strict order. Whole-file reads are a known
//! scalability limit kept for simplicity, and an unreadable file scans as
//! empty content rather than failing the run.

use crate::config::ScanConfig;
use crate::error::Result;
use crate::ignore::IgnoreMatcher;
use crate::reporter::{Reporter, RunSummary};
use crate::signatures::{MatchKind, Signature, SignatureStore};
use crate::verdict::{MatchRecord, RunStats, Verdict};
use crate::walk::Walker;
use crate::whitelist::WhitelistIndex;
use md5::{Digest, Md5};
use memchr::{memchr_iter, memmem};
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info};

pub struct ScanEngine<'a> {
    store: &'a SignatureStore,
    whitelist: &'a WhitelistIndex,
    config: &'a ScanConfig,
}

fn md5_hex(content: &[u8]) -> String {
    hex::encode(Md5::digest(content))
}

/// 1-based line of a match offset: newlines preceding it, plus one.
fn line_number_at(content: &[u8], offset: usize) -> u64 {
    memchr_iter(b'\n', &content[..offset]).count() as u64 + 1
}

impl<'a> ScanEngine<'a> {
    pub fn new(
        store: &'a SignatureStore,
        whitelist: &'a WhitelistIndex,
        config: &'a ScanConfig,
    ) -> Self {
        Self {
            store,
            whitelist,
            config,
        }
    }

    /// Earliest match offset of one signature in the content, or None.
    fn find(sig: &Signature, content: &[u8], folded: &mut Option<Vec<u8>>) -> Option<usize> {
        match sig.kind {
            MatchKind::RawExact => memmem::find(content, sig.pattern.as_bytes()),
            MatchKind::RawCaseInsensitive => {
                let haystack =
                    folded.get_or_insert_with(|| content.to_ascii_lowercase());
                memmem::find(haystack, sig.pattern.to_ascii_lowercase().as_bytes())
            }
            MatchKind::Regex => sig
                .regex
                .as_ref()
                .and_then(|re| re.find(content))
                .map(|m| m.start()),
        }
    }

    /// Scan one file to its terminal state, updating the run counters.
    pub fn scan_file(&self, path: &Path, stats: &mut RunStats) -> Vec<Verdict> {
        stats.files_scanned += 1;

        let content = match fs::read(path) {
            Ok(content) => content,
            Err(e) => {
                // Known gap kept from the reference behavior: an unreadable
                // file is treated as empty and reports clean.
                debug!(path = %path.display(), error = %e, "File not readable, scanning as empty");
                Vec::new()
            }
        };
        let hash = md5_hex(&content);
        let path_str = path.display().to_string();

        if self.whitelist.contains(&hash) {
            return vec![Verdict::whitelisted(path_str, hash)];
        }

        // Case-folded copy of the content, built once on first use.
        let mut folded: Option<Vec<u8>> = None;
        let mut records = Vec::new();

        'groups: for group in self.store.groups() {
            for sig in group.iter() {
                if let Some(offset) = Self::find(sig, &content, &mut folded) {
                    let line_number = self
                        .config
                        .line_numbers
                        .then(|| line_number_at(&content, offset));
                    records.push(MatchRecord {
                        pattern: sig.pattern.clone(),
                        comment: sig.comment.clone(),
                        line_number,
                    });
                    if self.config.stop_on_first_match {
                        break 'groups;
                    }
                }
            }
        }

        if records.is_empty() {
            return vec![Verdict::clean(path_str, hash)];
        }

        stats.files_infected += 1;
        records
            .into_iter()
            .map(|record| Verdict::infected(path_str.clone(), hash.clone(), record))
            .collect()
    }
}

/// Run a complete scan: load signatures and whitelists, walk every root,
/// report each verdict as it is produced, and return the run counters.
pub fn run_scan(config: &ScanConfig, reporter: &mut dyn Reporter) -> Result<RunStats> {
    config.validate()?;

    let mut store = if config.base64_mode {
        SignatureStore::load_base64(&config.base64_dir)
    } else {
        SignatureStore::load_standard(&config.definitions_dir)
    };
    if config.extra_checks {
        store.apply_extra_checks();
    }
    debug!(signatures = store.total_signatures(), "Signature store loaded");

    let mut whitelist = WhitelistIndex::default();
    whitelist.load_local(&config.whitelist_files);
    if let Some(version) = &config.wordpress_version {
        let added = whitelist.add_wordpress_checksums(version)?;
        info!(version, added, "WordPress checksums whitelisted");
    }
    if config.combined_whitelist {
        let count = whitelist.sync_combined(
            &config.combined_base_url,
            &config.combined_cache_path,
            config.integrity_policy,
        )?;
        info!(count, "Combined whitelist loaded");
    }

    let ignore = IgnoreMatcher::compile(&config.ignore_rules)?;
    let walker = Walker::new(config, ignore);
    let engine = ScanEngine::new(&store, &whitelist, config);

    let started_at = SystemTime::now();
    let mut stats = RunStats::default();

    for root in &config.roots {
        walker.walk(root, &mut stats, &mut |stats, candidate| {
            let verdicts = engine.scan_file(&candidate.path, stats);
            reporter.file_verdicts(&verdicts);
        });
    }

    reporter.summary(
        &stats,
        &RunSummary {
            started_at,
            finished_at: SystemTime::now(),
            roots: config.roots.clone(),
        },
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::FileStatus;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_definitions(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(
            dir.join("patterns_raw.txt"),
            "# web shell loader\neval(base64_decode(\n# rot13 loader\nstr_rot13(\n",
        )
        .unwrap();
        fs::write(dir.join("patterns_iraw.txt"), "# mailer\nMAIL_BOMB\n").unwrap();
        fs::write(
            dir.join("patterns_re.txt"),
            "# hex escapes\n\\\\x[0-9a-f]{2}\\\\x[0-9a-f]{2}\n",
        )
        .unwrap();
    }

    struct Fixture {
        dir: TempDir,
        store: SignatureStore,
        config: ScanConfig,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let defs = dir.path().join("definitions");
        write_definitions(&defs);
        let store = SignatureStore::load_standard(&defs);
        let config = ScanConfig {
            roots: vec![dir.path().to_path_buf()],
            definitions_dir: defs,
            whitelist_files: Vec::new(),
            ..ScanConfig::default()
        };
        Fixture { dir, store, config }
    }

    fn scan(
        fixture: &Fixture,
        whitelist: &WhitelistIndex,
        name: &str,
        content: &[u8],
    ) -> (Vec<Verdict>, RunStats) {
        let path = fixture.dir.path().join(name);
        fs::write(&path, content).unwrap();
        let engine = ScanEngine::new(&fixture.store, whitelist, &fixture.config);
        let mut stats = RunStats::default();
        let verdicts = engine.scan_file(&path, &mut stats);
        (verdicts, stats)
    }

    #[test]
    fn test_clean_file() {
        let f = fixture();
        let wl = WhitelistIndex::default();
        let (verdicts, stats) = scan(&f, &wl, "clean.php", b"<?php echo 'hello'; ?>");
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].status, FileStatus::Clean);
        assert_eq!(stats.files_scanned, 1);
        assert_eq!(stats.files_infected, 0);
    }

    #[test]
    fn test_raw_exact_match() {
        let f = fixture();
        let wl = WhitelistIndex::default();
        let (verdicts, stats) =
            scan(&f, &wl, "bad.php", b"<?php eval(base64_decode('x')); ?>");
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].status, FileStatus::Infected);
        let record = verdicts[0].matched.as_ref().unwrap();
        assert_eq!(record.pattern, "eval(base64_decode(");
        assert_eq!(record.comment, "web shell loader");
        assert_eq!(stats.files_infected, 1);
    }

    #[test]
    fn test_case_insensitive_match() {
        let f = fixture();
        let wl = WhitelistIndex::default();
        let (verdicts, _) = scan(&f, &wl, "bomb.php", b"<?php mail_bomb(); ?>");
        assert_eq!(verdicts[0].status, FileStatus::Infected);
        assert_eq!(verdicts[0].matched.as_ref().unwrap().pattern, "MAIL_BOMB");
    }

    #[test]
    fn test_regex_match_is_case_insensitive_multiline() {
        let f = fixture();
        let wl = WhitelistIndex::default();
        let (verdicts, _) = scan(&f, &wl, "hex.php", b"<?php\n$s = \"\\x4A\\x6F\";\n");
        assert_eq!(verdicts[0].status, FileStatus::Infected);
    }

    #[test]
    fn test_stop_on_first_match_yields_one_record() {
        let f = fixture();
        let wl = WhitelistIndex::default();
        let content = b"<?php eval(base64_decode('x')); str_rot13('y'); ?>";
        let (verdicts, stats) = scan(&f, &wl, "double.php", content);
        assert_eq!(verdicts.len(), 1);
        assert_eq!(stats.files_infected, 1);
    }

    #[test]
    fn test_no_stop_yields_record_per_match() {
        let mut f = fixture();
        f.config.stop_on_first_match = false;
        let wl = WhitelistIndex::default();
        let content = b"<?php eval(base64_decode('x')); str_rot13('y'); ?>";
        let (verdicts, stats) = scan(&f, &wl, "double.php", content);
        assert_eq!(verdicts.len(), 2);
        assert!(verdicts.iter().all(|v| v.status == FileStatus::Infected));
        // Infected files count once no matter how many records they emit.
        assert_eq!(stats.files_infected, 1);
    }

    #[test]
    fn test_group_order_raw_before_regex() {
        let mut f = fixture();
        f.config.stop_on_first_match = false;
        let wl = WhitelistIndex::default();
        let content = b"<?php \"\\x4a\\x6f\"; eval(base64_decode('x')); ?>";
        let (verdicts, _) = scan(&f, &wl, "order.php", content);
        // Raw group runs first even though the regex match sits earlier in
        // the buffer.
        assert_eq!(
            verdicts[0].matched.as_ref().unwrap().pattern,
            "eval(base64_decode("
        );
    }

    #[test]
    fn test_whitelisted_file_skips_matching() {
        let f = fixture();
        let content: &[u8] = b"<?php eval(base64_decode('x')); ?>";
        let mut wl = WhitelistIndex::default();
        wl.add_hash(&md5_hex(content));

        let (verdicts, stats) = scan(&f, &wl, "trusted.php", content);
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].status, FileStatus::Whitelisted);
        assert_eq!(stats.files_infected, 0);
    }

    #[test]
    fn test_line_numbers_reported_when_requested() {
        let mut f = fixture();
        f.config.line_numbers = true;
        let wl = WhitelistIndex::default();
        let content = b"<?php\n// line two\neval(base64_decode('x'));\n";
        let (verdicts, _) = scan(&f, &wl, "lines.php", content);
        assert_eq!(verdicts[0].matched.as_ref().unwrap().line_number, Some(3));
    }

    #[test]
    fn test_line_numbers_absent_by_default() {
        let f = fixture();
        let wl = WhitelistIndex::default();
        let (verdicts, _) = scan(&f, &wl, "lines.php", b"eval(base64_decode('x'));");
        assert_eq!(verdicts[0].matched.as_ref().unwrap().line_number, None);
    }

    #[test]
    fn test_unreadable_file_scans_as_empty_and_clean() {
        let f = fixture();
        let wl = WhitelistIndex::default();
        let engine = ScanEngine::new(&f.store, &wl, &f.config);
        let mut stats = RunStats::default();
        let verdicts = engine.scan_file(&PathBuf::from("/nonexistent/gone.php"), &mut stats);
        assert_eq!(verdicts[0].status, FileStatus::Clean);
        // MD5 of empty content.
        assert_eq!(verdicts[0].content_hash, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(stats.files_scanned, 1);
    }

    #[test]
    fn test_line_number_at() {
        let content = b"a\nb\nmatch";
        assert_eq!(line_number_at(content, 0), 1);
        assert_eq!(line_number_at(content, 2), 2);
        assert_eq!(line_number_at(content, 4), 3);
    }
}
