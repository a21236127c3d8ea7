//! Full-article text: scraping, extraction and the content cache.
//!
//! - `extract` - picks the main-content fragment of a page, plus the title/meta fallback
//! - `sanitize` - turns an HTML fragment into plain paragraph text
//! - `cache` - TTL-gated, bounded store of scraped text
//! - `scrape` - the cache-fronted [`ScrapeService`] and its HTTP page fetcher
//!
//! Extraction and sanitization are pure functions; only the scrape service
//! touches the network or the cache.

mod cache;
mod extract;
mod sanitize;
mod scrape;

pub use cache::{CacheStats, CachedContentEntry, ContentCache};
pub use extract::{extract_fallback, extract_main_content, MIN_BLOCK_LEN};
pub use sanitize::sanitize;
pub use scrape::{
    html_to_text, HttpPageFetcher, PageFetcher, PrewarmOutcome, ScrapeError, ScrapeService,
    MIN_CONTENT_CHARS, MIN_FALLBACK_CHARS,
};
