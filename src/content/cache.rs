use std::num::NonZeroUsize;
use std::time::Duration;

use lru::LruCache;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Scraped text for one article URL.
///
/// `success == false` records a failed background scrape; such entries only
/// tell the pre-warm path not to retry a broken page before the TTL runs out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedContentEntry {
    pub url: String,
    pub content: String,
    pub fetched_at: Instant,
    pub success: bool,
}

/// Aggregate view of the content cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub failed_entries: usize,
}

/// TTL-gated, capacity-bounded store of extracted article text.
///
/// Lookups use `peek` so they never reorder the LRU list and can run under
/// the shared lock; only stores and eviction take the exclusive lock. When
/// full, the oldest inserted entry is dropped.
pub struct ContentCache {
    ttl: Duration,
    entries: RwLock<LruCache<String, CachedContentEntry>>,
}

impl ContentCache {
    pub fn new(ttl: Duration, capacity: NonZeroUsize) -> Self {
        Self {
            ttl,
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Content of a fresh, successful entry.
    pub async fn get_fresh(&self, url: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries
            .peek(url)
            .filter(|entry| entry.success && self.is_fresh(entry))
            .map(|entry| entry.content.clone())
    }

    /// True when `url` has no entry or only a stale one. A fresh failure
    /// record counts as present.
    pub async fn needs_refresh(&self, url: &str) -> bool {
        let entries = self.entries.read().await;
        entries.peek(url).map_or(true, |entry| !self.is_fresh(entry))
    }

    /// Snapshot of the raw entry, whatever its state.
    pub async fn entry(&self, url: &str) -> Option<CachedContentEntry> {
        self.entries.read().await.peek(url).cloned()
    }

    pub async fn store_success(&self, url: &str, content: String) {
        self.store(CachedContentEntry {
            url: url.to_string(),
            content,
            fetched_at: Instant::now(),
            success: true,
        })
        .await;
    }

    pub async fn store_failure(&self, url: &str) {
        self.store(CachedContentEntry {
            url: url.to_string(),
            content: String::new(),
            fetched_at: Instant::now(),
            success: false,
        })
        .await;
    }

    async fn store(&self, entry: CachedContentEntry) {
        let key = entry.url.clone();
        let mut entries = self.entries.write().await;
        // `push` also hands back the previous value when the key was already present
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if evicted != key {
                tracing::trace!(url = %evicted, "Content cache full, evicted oldest entry");
            }
        }
    }

    /// Removes stale entries. Returns how many were dropped.
    pub async fn evict_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !self.is_fresh(entry))
            .map(|(url, _)| url.clone())
            .collect();
        for url in &expired {
            entries.pop(url);
        }
        expired.len()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        entries
            .iter()
            .fold(CacheStats::default(), |mut stats, (_, entry)| {
                stats.total_entries += 1;
                if self.is_fresh(entry) {
                    stats.fresh_entries += 1;
                }
                if !entry.success {
                    stats.failed_entries += 1;
                }
                stats
            })
    }

    fn is_fresh(&self, entry: &CachedContentEntry) -> bool {
        entry.fetched_at.elapsed() < self.ttl
    }
}
