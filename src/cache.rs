//! Dedup cache for already-forwarded contract addresses
//!
//! The single source of dedup truth. Explicitly owned and injectable
//! (`Arc<SeenCache>`) so engines can be tested in isolation. Grows
//! monotonically during a run; never evicts. The persistence task only ever
//! reads snapshots, it never mutates the live set.

use crate::logger::{self, LogTag};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::Path;

struct SeenInner {
    seen: HashSet<String>,
    // Serialized size of the newline-delimited snapshot, kept incrementally.
    bytes: usize,
}

pub struct SeenCache {
    inner: Mutex<SeenInner>,
}

impl SeenCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SeenInner {
                seen: HashSet::new(),
                bytes: 0,
            }),
        }
    }

    /// Populate the cache from a newline-delimited snapshot file.
    ///
    /// A missing file is not an error and yields an empty cache. Returns the
    /// number of addresses loaded.
    pub fn load(&self, path: &Path) -> std::io::Result<usize> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                logger::info(
                    LogTag::Cache,
                    &format!("No snapshot at {}, starting empty", path.display()),
                );
                return Ok(0);
            }
            Err(e) => return Err(e),
        };

        let mut inner = self.inner.lock();
        for line in content.lines() {
            let address = line.trim();
            if address.is_empty() {
                continue;
            }
            if inner.seen.insert(address.to_string()) {
                inner.bytes += address.len() + 1;
            }
        }
        Ok(inner.seen.len())
    }

    /// Return the subset of `candidates` not seen before, inserting that
    /// subset before returning.
    ///
    /// Check and insert happen under one lock so no address can be reported
    /// as new twice, regardless of which chain it was extracted under or how
    /// many extraction calls race.
    pub fn claim_new<'a, I>(&self, candidates: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut inner = self.inner.lock();
        let mut fresh = Vec::new();
        for candidate in candidates {
            if inner.seen.insert(candidate.to_string()) {
                inner.bytes += candidate.len() + 1;
                fresh.push(candidate.to_string());
            }
        }
        fresh
    }

    /// Consistent point-in-time copy for the persistence task. Sorted so
    /// snapshot files are stable and diffable.
    pub fn snapshot(&self) -> Vec<String> {
        let inner = self.inner.lock();
        let mut addresses: Vec<String> = inner.seen.iter().cloned().collect();
        addresses.sort();
        addresses
    }

    pub fn len(&self) -> usize {
        self.inner.lock().seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialized byte size of the current set, used by the persistence task
    /// for its size warning. Purely observational.
    pub fn approx_bytes(&self) -> usize {
        self.inner.lock().bytes
    }
}

impl Default for SeenCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{self, ChainId};
    use std::io::Write;

    #[test]
    fn claim_new_returns_only_unseen() {
        let cache = SeenCache::new();
        let fresh = cache.claim_new(["a", "b"]);
        assert_eq!(fresh, vec!["a".to_string(), "b".to_string()]);

        let again = cache.claim_new(["a", "b", "c"]);
        assert_eq!(again, vec!["c".to_string()]);
    }

    #[test]
    fn double_extraction_claims_nothing_second_time() {
        let text = "Buy CA: 0x1234567890abcdef1234567890abcdef12345678 now";
        let cache = SeenCache::new();

        let extracted = patterns::extract(text);
        let candidates = &extracted[&ChainId::Evm];
        let first = cache.claim_new(candidates.iter().map(|s| s.as_str()));
        assert_eq!(first.len(), 1);

        let extracted = patterns::extract(text);
        let candidates = &extracted[&ChainId::Evm];
        let second = cache.claim_new(candidates.iter().map(|s| s.as_str()));
        assert!(second.is_empty());
    }

    #[test]
    fn claim_is_chain_agnostic() {
        // An address claimed under one chain is never new under another.
        let cache = SeenCache::new();
        let addr = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
        assert_eq!(cache.claim_new([addr]).len(), 1);
        assert!(cache.claim_new([addr]).is_empty());
        assert!(cache.claim_new([addr]).is_empty());
    }

    #[test]
    fn load_missing_file_yields_empty_cache() {
        let cache = SeenCache::new();
        let dir = tempfile::tempdir().unwrap();
        let loaded = cache.load(&dir.path().join("nope.txt")).unwrap();
        assert_eq!(loaded, 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn snapshot_round_trip() {
        let cache = SeenCache::new();
        cache.claim_new(["addr-b", "addr-a", "addr-c"]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        for address in cache.snapshot() {
            writeln!(file, "{}", address).unwrap();
        }

        let restored = SeenCache::new();
        restored.load(&path).unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.snapshot(), cache.snapshot());
        assert!(restored.claim_new(["addr-a"]).is_empty());
    }

    #[test]
    fn byte_accounting_tracks_entries() {
        let cache = SeenCache::new();
        assert_eq!(cache.approx_bytes(), 0);
        cache.claim_new(["abcd"]);
        assert_eq!(cache.approx_bytes(), 5);
        // Re-claiming does not double count.
        cache.claim_new(["abcd"]);
        assert_eq!(cache.approx_bytes(), 5);
    }
}
