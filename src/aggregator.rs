//! Fan-out/fan-in aggregation across a user's feeds.
//!
//! One task per feed goes through the [`FeedCache`]; the call returns only
//! once every task has finished, so it is as slow as the slowest feed (each
//! bounded by its own fetch deadline). The merged list is sorted newest first,
//! truncated, and its head handed to the [`PrewarmPool`] without waiting.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use futures::future::join_all;

use crate::config::Config;
use crate::content::{ContentCache, HttpPageFetcher, PageFetcher, ScrapeService};
use crate::feed::{FeedCache, FeedFetcher, FeedLoader};
use crate::prewarm::{PrewarmPool, PrewarmStats};
use crate::types::{Article, FeedSource};

/// Supplies a user's subscriptions. Lives outside this crate.
pub trait SubscriptionStore {
    fn list_active_feeds(&self, user: &str) -> Vec<FeedSource>;
}

/// Answers whether an article link is among the user's favorites.
pub trait FavoritesStore {
    fn is_favorite(&self, link: &str) -> bool;
}

/// Orders articles newest first, ties broken by ascending title.
///
/// Relies on `published_at` being `YYYY-MM-DD HH:MM`; undated articles
/// (empty string) sort last.
pub fn compare_articles(a: &Article, b: &Article) -> Ordering {
    b.published_at
        .cmp(&a.published_at)
        .then_with(|| a.title.cmp(&b.title))
}

pub fn sort_articles(articles: &mut [Article]) {
    articles.sort_by(compare_articles);
}

/// Sets `is_favorite` on each article from the favorites store.
pub fn mark_favorites<S: FavoritesStore + ?Sized>(articles: &mut [Article], favorites: &S) {
    for article in articles.iter_mut() {
        article.is_favorite = favorites.is_favorite(&article.link);
    }
}

pub struct Aggregator<L, F> {
    feeds: Arc<FeedCache<L>>,
    scraper: Arc<ScrapeService<F>>,
    prewarm: PrewarmPool,
    max_articles: usize,
    prewarm_count: usize,
}

impl Aggregator<FeedFetcher, HttpPageFetcher> {
    /// Wires the production fetchers, both caches and the pre-warm pool.
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let feeds = Arc::new(FeedCache::new(
            FeedFetcher::new(config)?,
            config.feed_cache_ttl(),
        ));
        let capacity =
            NonZeroUsize::new(config.content_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        let scraper = Arc::new(ScrapeService::new(
            HttpPageFetcher::new(config)?,
            ContentCache::new(config.content_cache_ttl(), capacity),
        ));
        Ok(Self::new(feeds, scraper, config))
    }
}

impl<L: FeedLoader, F: PageFetcher> Aggregator<L, F> {
    /// Builds an aggregator over existing caches and spawns its pre-warm pool.
    pub fn new(
        feeds: Arc<FeedCache<L>>,
        scraper: Arc<ScrapeService<F>>,
        config: &Config,
    ) -> Self {
        let prewarm = PrewarmPool::spawn(
            Arc::clone(&scraper),
            config.prewarm_workers,
            config.prewarm_queue,
        );
        Self {
            feeds,
            scraper,
            prewarm,
            max_articles: config.max_articles,
            prewarm_count: config.prewarm_count,
        }
    }

    pub fn feed_cache(&self) -> &FeedCache<L> {
        &self.feeds
    }

    pub fn scraper(&self) -> &ScrapeService<F> {
        &self.scraper
    }

    pub fn prewarm_stats(&self) -> PrewarmStats {
        self.prewarm.stats()
    }

    /// Operator-facing cache reset; maps directly onto [`FeedCache::clear`].
    pub async fn clear_feed_cache(&self) {
        self.feeds.clear().await;
    }

    /// Aggregates the given feed URLs.
    ///
    /// Never fails: a feed that is down contributes nothing. Repeated URLs are
    /// fetched once since a feed's identity is its URL. Results are merged in
    /// input order whatever order the fetches finish in, so equal sort keys
    /// always come out the same way.
    pub async fn aggregate(&self, feed_urls: &[String]) -> Vec<Article> {
        let mut seen = HashSet::new();

        let tasks: Vec<_> = feed_urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .map(|url| {
                let feeds = Arc::clone(&self.feeds);
                let url = url.clone();
                tokio::spawn(async move { feeds.get_or_fetch(&url).await })
            })
            .collect();

        let feed_count = tasks.len();
        let mut articles = Vec::new();
        for result in join_all(tasks).await {
            match result {
                Ok(feed_articles) => articles.extend(feed_articles.iter().cloned()),
                Err(e) => tracing::error!(error = %e, "Feed task failed to complete"),
            }
        }

        let collected = articles.len();
        sort_articles(&mut articles);
        articles.truncate(self.max_articles);

        tracing::info!(
            feeds = feed_count,
            collected = collected,
            returned = articles.len(),
            "Aggregated feeds"
        );

        self.schedule_prewarm(&articles);
        articles
    }

    /// Aggregates the active sources, ignoring inactive ones.
    pub async fn aggregate_sources(&self, sources: &[FeedSource]) -> Vec<Article> {
        let urls: Vec<String> = sources
            .iter()
            .filter(|s| s.active)
            .map(|s| s.url.clone())
            .collect();
        self.aggregate(&urls).await
    }

    /// Full per-user flow: subscriptions in, sorted articles with favorite
    /// flags out.
    pub async fn aggregate_for_user<S, V>(
        &self,
        user: &str,
        subscriptions: &S,
        favorites: &V,
    ) -> Vec<Article>
    where
        S: SubscriptionStore + ?Sized,
        V: FavoritesStore + ?Sized,
    {
        let sources = subscriptions.list_active_feeds(user);
        let mut articles = self.aggregate_sources(&sources).await;
        mark_favorites(&mut articles, favorites);
        articles
    }

    /// Queues the newest articles for background scraping. Freshness is
    /// checked by the workers, so this only pays for a channel send per link.
    fn schedule_prewarm(&self, articles: &[Article]) {
        let mut queued = 0;
        for article in articles.iter().take(self.prewarm_count) {
            if article.link.is_empty() {
                continue;
            }
            if self.prewarm.submit(article.link.clone()) {
                queued += 1;
            }
        }
        if queued > 0 {
            tracing::debug!(queued = queued, "Queued articles for pre-warm");
        }
    }
}
