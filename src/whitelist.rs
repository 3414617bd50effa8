//! Known-good content hash index.
//!
//! Two storage tiers answer membership queries. The local tier is an
//! unordered list built from whitelist files in configured order and is
//! scanned linearly. The combined tier is a remotely distributed,
//! gzip-compressed archive of pre-sorted hashes, verified against a
//! published sha256 digest and searched with a binary search. The combined
//! tier is only consulted when it has been explicitly enabled and loaded.

use crate::error::{MalscanError, Result};
use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What to do when the downloaded archive does not hash to the published
/// digest.
///
/// The reference behavior reports the mismatch and loads the archive anyway
/// (availability over strictness); `Strict` turns the mismatch into a fatal
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityPolicy {
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, Default)]
pub struct WhitelistIndex {
    local: Vec<String>,
    combined: Vec<String>,
    combined_enabled: bool,
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn fetch_text(url: &str) -> Result<String> {
    let response = ureq::get(url).call().map_err(|e| MalscanError::RemoteFetch {
        url: url.to_string(),
        source: Box::new(e),
    })?;
    response.into_string().map_err(|e| MalscanError::RemoteFetch {
        url: url.to_string(),
        source: Box::new(e),
    })
}

fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url).call().map_err(|e| MalscanError::RemoteFetch {
        url: url.to_string(),
        source: Box::new(e),
    })?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|e| MalscanError::RemoteFetch {
            url: url.to_string(),
            source: Box::new(e),
        })?;
    Ok(bytes)
}

pub(crate) fn extract_wordpress_checksums(
    json: &serde_json::Value,
    version: &str,
) -> Result<Vec<String>> {
    let checksums = json
        .get("checksums")
        .and_then(|c| c.get(version))
        .and_then(|v| v.as_object())
        .ok_or_else(|| MalscanError::ChecksumFeed(version.to_string()))?;

    Ok(checksums
        .values()
        .filter_map(|v| v.as_str())
        .map(str::to_string)
        .collect())
}

impl WhitelistIndex {
    /// Append the local tier from whitelist files in configured order.
    /// Only the first 32 characters of each non-empty line are significant;
    /// unreadable files are skipped without error.
    pub fn load_local(&mut self, files: &[PathBuf]) {
        for file in files {
            let content = match fs::read_to_string(file) {
                Ok(c) => c,
                Err(e) => {
                    debug!(path = %file.display(), error = %e, "Whitelist file not readable");
                    continue;
                }
            };
            for line in content.lines() {
                if line.is_empty() {
                    continue;
                }
                let digest = line.get(..32).unwrap_or(line);
                self.local.push(digest.to_string());
            }
        }
        debug!(entries = self.local.len(), "Local whitelist tier loaded");
    }

    /// Append a single digest to the local tier.
    pub fn add_hash(&mut self, hash: &str) {
        self.local.push(hash.to_string());
    }

    /// Fetch the WordPress core checksum feed for `version` and append every
    /// file digest to the local tier. Failure is fatal for the run.
    pub fn add_wordpress_checksums(&mut self, version: &str) -> Result<usize> {
        let url = format!("https://api.wordpress.org/core/checksums/1.0/?version={version}");
        let body = fetch_text(&url)?;
        let json: serde_json::Value = serde_json::from_str(&body)?;
        let hashes = extract_wordpress_checksums(&json, version)?;
        let added = hashes.len();
        self.local.extend(hashes);
        debug!(version, added, "WordPress checksums added to whitelist");
        Ok(added)
    }

    /// Synchronize the combined tier with the canonical remote archive.
    ///
    /// Fetches the published digest, reuses the cached archive when its own
    /// sha256 still matches, downloads and re-verifies otherwise. Returns the
    /// number of loaded entries.
    pub fn sync_combined(
        &mut self,
        base_url: &str,
        cache_path: &Path,
        policy: IntegrityPolicy,
    ) -> Result<usize> {
        let digest_url = format!("{base_url}/database/compressed.sha256");
        let expected = fetch_text(&digest_url)?.trim().to_lowercase();

        let cached = fs::read(cache_path).ok();
        let data = match cached {
            Some(bytes) if sha256_hex(&bytes) == expected => {
                debug!(path = %cache_path.display(), "Reusing cached combined whitelist archive");
                bytes
            }
            _ => {
                let archive_url = format!("{base_url}/database/compressed.dat");
                let bytes = fetch_bytes(&archive_url)?;
                fs::write(cache_path, &bytes)
                    .map_err(|e| MalscanError::write_error(cache_path, e))?;

                let actual = sha256_hex(&bytes);
                if actual != expected {
                    match policy {
                        IntegrityPolicy::Strict => {
                            return Err(MalscanError::Integrity { expected, actual });
                        }
                        IntegrityPolicy::Lenient => {
                            warn!(
                                expected,
                                actual,
                                "Combined whitelist digest mismatch, loading archive anyway"
                            );
                        }
                    }
                }
                bytes
            }
        };

        self.load_combined_archive(&data)
    }

    /// Decompress and store a combined archive. The archive contract is an
    /// ascending-sorted, newline-separated hash list with a trailing
    /// newline; sortedness is enforced here because the binary search
    /// depends on it.
    pub fn load_combined_archive(&mut self, gz: &[u8]) -> Result<usize> {
        let mut text = String::new();
        GzDecoder::new(gz)
            .read_to_string(&mut text)
            .map_err(|e| MalscanError::InvalidArchive(e.to_string()))?;

        let mut hashes: Vec<String> = text
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        if !hashes.windows(2).all(|w| w[0] <= w[1]) {
            warn!("Combined whitelist archive arrived unsorted, sorting");
            hashes.sort_unstable();
        }

        let count = hashes.len();
        self.combined = hashes;
        self.combined_enabled = true;
        debug!(count, "Combined whitelist tier loaded");
        Ok(count)
    }

    /// Membership query: combined tier first (when enabled), then a linear
    /// scan of the local tier.
    pub fn contains(&self, hash: &str) -> bool {
        if self.combined_enabled && self.search_combined(hash).is_some() {
            return true;
        }
        self.local.iter().any(|h| h == hash)
    }

    /// Closed-range binary search over the sorted combined tier.
    fn search_combined(&self, needle: &str) -> Option<usize> {
        let mut low: isize = 0;
        let mut high: isize = self.combined.len() as isize - 1;
        while low <= high {
            let mid = (low + high) / 2;
            match needle.cmp(self.combined[mid as usize].as_str()) {
                Ordering::Less => high = mid - 1,
                Ordering::Greater => low = mid + 1,
                Ordering::Equal => return Some(mid as usize),
            }
        }
        None
    }

    pub fn combined_count(&self) -> usize {
        self.combined.len()
    }

    pub fn local_count(&self) -> usize {
        self.local.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn index_with_combined(hashes: &[&str]) -> WhitelistIndex {
        let mut index = WhitelistIndex::default();
        let archive = format!("{}\n", hashes.join("\n"));
        index.load_combined_archive(&gzip(&archive)).unwrap();
        index
    }

    #[test]
    fn test_combined_membership_first_last_middle() {
        let hashes = [
            "0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a",
            "5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b",
            "7c7c7c7c7c7c7c7c7c7c7c7c7c7c7c7c",
            "9d9d9d9d9d9d9d9d9d9d9d9d9d9d9d9d",
            "ffffffffffffffffffffffffffffffff",
        ];
        let index = index_with_combined(&hashes);

        for hash in &hashes {
            assert!(index.contains(hash), "missing {hash}");
        }
        assert!(!index.contains("1111111111111111111111111111111111"));
        assert!(!index.contains("00000000000000000000000000000000"));
    }

    #[test]
    fn test_combined_single_entry() {
        let index = index_with_combined(&["5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b"]);
        assert!(index.contains("5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b5b"));
        assert!(!index.contains("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn test_combined_empty_archive() {
        let index = index_with_combined(&[]);
        assert_eq!(index.combined_count(), 0);
        assert!(!index.contains("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn test_trailing_newline_entry_dropped() {
        let index = index_with_combined(&["aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"]);
        assert_eq!(index.combined_count(), 1);
    }

    #[test]
    fn test_unsorted_archive_is_sorted_on_load() {
        let mut index = WhitelistIndex::default();
        index
            .load_combined_archive(&gzip("cc\naa\nbb\n"))
            .unwrap();
        assert!(index.contains("aa"));
        assert!(index.contains("bb"));
        assert!(index.contains("cc"));
    }

    #[test]
    fn test_corrupt_archive_rejected() {
        let mut index = WhitelistIndex::default();
        let err = index.load_combined_archive(b"not gzip at all").unwrap_err();
        assert!(matches!(err, MalscanError::InvalidArchive(_)));
    }

    #[test]
    fn test_local_tier_linear_lookup() {
        let mut index = WhitelistIndex::default();
        index.add_hash("d41d8cd98f00b204e9800998ecf8427e");
        assert!(index.contains("d41d8cd98f00b204e9800998ecf8427e"));
        assert!(!index.contains("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn test_local_tier_truncates_to_32_chars() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("whitelist.txt");
        fs::write(
            &file,
            "d41d8cd98f00b204e9800998ecf8427e  core/index.php\n",
        )
        .unwrap();

        let mut index = WhitelistIndex::default();
        index.load_local(&[file]);
        assert!(index.contains("d41d8cd98f00b204e9800998ecf8427e"));
    }

    #[test]
    fn test_local_tier_skips_unreadable_files() {
        let mut index = WhitelistIndex::default();
        index.load_local(&[PathBuf::from("/nonexistent/whitelist.txt")]);
        assert_eq!(index.local_count(), 0);
    }

    #[test]
    fn test_local_tier_concatenates_files_in_order() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n").unwrap();
        fs::write(&b, "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb\n").unwrap();

        let mut index = WhitelistIndex::default();
        index.load_local(&[a, b]);
        assert_eq!(index.local_count(), 2);
        assert!(index.contains("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
        assert!(index.contains("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"));
    }

    #[test]
    fn test_combined_tier_only_queried_when_loaded() {
        let index = WhitelistIndex::default();
        assert!(!index.contains("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));
    }

    #[test]
    fn test_extract_wordpress_checksums() {
        let json: serde_json::Value = serde_json::from_str(
            r#"{"checksums": {"6.4.2": {
                "index.php": "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                "wp-load.php": "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"
            }}}"#,
        )
        .unwrap();

        let hashes = extract_wordpress_checksums(&json, "6.4.2").unwrap();
        assert_eq!(hashes.len(), 2);
        assert!(hashes.contains(&"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string()));
    }

    #[test]
    fn test_extract_wordpress_checksums_missing_version() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"checksums": {"6.4.2": false}}"#).unwrap();
        let err = extract_wordpress_checksums(&json, "6.4.2").unwrap_err();
        assert!(matches!(err, MalscanError::ChecksumFeed(_)));
    }
}
