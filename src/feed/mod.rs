//! Feed retrieval and feed-level caching.
//!
//! - `parser` - RSS/Atom parsing into [`Article`](crate::types::Article)s using `feed-rs`
//! - `fetcher` - HTTP fetching with a hard per-feed deadline; failures degrade to empty lists
//! - `cache` - TTL-gated, lock-guarded map of feed URL to parsed articles
//!
//! # Example
//!
//! ```ignore
//! use feedhub::feed::{FeedCache, FeedFetcher};
//!
//! let cache = FeedCache::new(FeedFetcher::new(&config)?, config.feed_cache_ttl());
//! let articles = cache.get_or_fetch("https://example.com/feed.xml").await;
//! ```

mod cache;
mod fetcher;
mod parser;

pub use cache::{CachedFeedEntry, FeedCache};
pub use fetcher::{FeedFetcher, FeedLoader, FetchError};
pub use parser::{parse_feed, source_label};
