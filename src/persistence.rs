//! Background persistence task for the dedup cache
//!
//! A long-lived loop, fully decoupled from message handling, that wakes on a
//! fixed interval and rewrites the snapshot file whenever the cache grew
//! since the last flush. On shutdown it performs one final unconditional
//! flush so the durable state matches memory; the caller joins the task
//! handle before exiting.
//!
//! Write failures are logged and otherwise ignored: the in-memory set is
//! unaffected and the next cycle retries naturally.

use crate::cache::SeenCache;
use crate::logger::{self, LogTag};
use crate::utils::check_shutdown_or_delay;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub struct PersistenceSettings {
    pub path: PathBuf,
    pub interval: Duration,
    pub size_warn_bytes: usize,
}

/// Run the flush loop until `shutdown` is signalled.
pub async fn persistence_loop(
    cache: Arc<SeenCache>,
    settings: PersistenceSettings,
    shutdown: Arc<Notify>,
) {
    logger::info(
        LogTag::Persist,
        &format!(
            "Persistence task started ({}, every {}s)",
            settings.path.display(),
            settings.interval.as_secs()
        ),
    );

    let mut last_flushed_len = cache.len();

    loop {
        if check_shutdown_or_delay(&shutdown, settings.interval).await {
            // Final flush regardless of whether the size changed.
            flush(&cache, &settings.path).await;
            logger::info(LogTag::Persist, "Persistence task shutting down, state flushed");
            break;
        }

        let bytes = cache.approx_bytes();
        if bytes > settings.size_warn_bytes {
            logger::warning(
                LogTag::Persist,
                &format!(
                    "Seen-address cache is {} bytes (threshold {}), consider pruning the snapshot file",
                    bytes, settings.size_warn_bytes
                ),
            );
        }

        let len = cache.len();
        if len == last_flushed_len {
            logger::verbose(LogTag::Persist, "Cache unchanged, skipping flush");
            continue;
        }

        if flush(&cache, &settings.path).await {
            last_flushed_len = len;
        }
    }
}

/// Write a snapshot to disk, overwriting the previous file wholesale.
/// Returns false on failure (logged, retried next cycle).
async fn flush(cache: &SeenCache, path: &PathBuf) -> bool {
    let snapshot = cache.snapshot();
    let mut content = snapshot.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }

    match tokio::fs::write(path, content).await {
        Ok(()) => {
            logger::debug(
                LogTag::Persist,
                &format!("Flushed {} address(es) to {}", snapshot.len(), path.display()),
            );
            true
        }
        Err(e) => {
            logger::error(
                LogTag::Persist,
                &format!("Failed to write {}: {}", path.display(), e),
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(path: PathBuf, interval_ms: u64) -> PersistenceSettings {
        PersistenceSettings {
            path,
            interval: Duration::from_millis(interval_ms),
            size_warn_bytes: 10 * 1024 * 1024,
        }
    }

    #[tokio::test]
    async fn flushes_changes_and_final_state_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.txt");
        let cache = Arc::new(SeenCache::new());
        let shutdown = Arc::new(Notify::new());

        cache.claim_new(["addr-1", "addr-2"]);

        let handle = tokio::spawn(persistence_loop(
            cache.clone(),
            settings(path.clone(), 20),
            shutdown.clone(),
        ));

        // Give the loop a couple of cycles to pick up the change.
        tokio::time::sleep(Duration::from_millis(80)).await;

        // Mutate again, then signal shutdown; the final flush must include it.
        cache.claim_new(["addr-3"]);
        shutdown.notify_one();
        handle.await.unwrap();

        let restored = SeenCache::new();
        restored.load(&path).unwrap();
        assert_eq!(restored.len(), 3);
        assert!(restored.claim_new(["addr-3"]).is_empty());
    }

    #[tokio::test]
    async fn size_warning_does_not_prevent_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seen.txt");
        let cache = Arc::new(SeenCache::new());
        let shutdown = Arc::new(Notify::new());

        cache.claim_new(["addr-over-threshold"]);

        // Tiny threshold so the warning fires every cycle.
        let mut s = settings(path.clone(), 20);
        s.size_warn_bytes = 1;

        let handle = tokio::spawn(persistence_loop(cache.clone(), s, shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(80)).await;
        shutdown.notify_one();
        handle.await.unwrap();

        let restored = SeenCache::new();
        restored.load(&path).unwrap();
        assert_eq!(restored.len(), 1);
    }

    #[tokio::test]
    async fn unwritable_path_leaves_cache_intact() {
        let cache = Arc::new(SeenCache::new());
        cache.claim_new(["addr-1"]);

        // Directory path, cannot be written as a file.
        let dir = tempfile::tempdir().unwrap();
        let ok = flush(&cache, &dir.path().to_path_buf()).await;
        assert!(!ok);
        assert_eq!(cache.len(), 1);
    }
}
