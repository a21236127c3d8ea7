use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::feed::fetcher::FeedLoader;
use crate::types::Article;

/// One cached feed result. Never mutated; a refresh replaces the whole entry.
#[derive(Debug, Clone)]
pub struct CachedFeedEntry {
    pub feed_url: String,
    pub articles: Arc<[Article]>,
    pub fetched_at: Instant,
}

impl CachedFeedEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// TTL-gated cache of parsed feeds keyed by feed URL.
///
/// Reads take the shared lock, stores and [`clear`](Self::clear) take the
/// exclusive lock. Concurrent misses on the same URL are not coalesced: each
/// caller fetches and the last store wins.
pub struct FeedCache<L> {
    loader: L,
    ttl: Duration,
    entries: RwLock<HashMap<String, CachedFeedEntry>>,
}

impl<L: FeedLoader> FeedCache<L> {
    pub fn new(loader: L, ttl: Duration) -> Self {
        Self {
            loader,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached articles for `feed_url`, fetching on miss or staleness.
    ///
    /// Empty results (including fetch failures) are cached like any other.
    pub async fn get_or_fetch(&self, feed_url: &str) -> Arc<[Article]> {
        let cached = {
            let entries = self.entries.read().await;
            entries
                .get(feed_url)
                .filter(|entry| entry.is_fresh(self.ttl))
                .map(|entry| Arc::clone(&entry.articles))
        };
        if let Some(articles) = cached {
            tracing::debug!(feed = %feed_url, "Feed cache hit");
            return articles;
        }

        tracing::debug!(feed = %feed_url, "Feed cache miss");
        let articles: Arc<[Article]> = self.loader.load(feed_url).await.into();

        let entry = CachedFeedEntry {
            feed_url: feed_url.to_string(),
            articles: Arc::clone(&articles),
            fetched_at: Instant::now(),
        };
        self.entries
            .write()
            .await
            .insert(feed_url.to_string(), entry);

        articles
    }

    /// Snapshot of the entry for `feed_url`, fresh or not.
    pub async fn entry(&self, feed_url: &str) -> Option<CachedFeedEntry> {
        self.entries.read().await.get(feed_url).cloned()
    }

    /// Drops every entry. Fetches already in flight will still store their
    /// result when they complete.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let dropped = entries.len();
        *entries = HashMap::new();
        tracing::info!(dropped = dropped, "Feed cache cleared");
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
