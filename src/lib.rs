//! Feed aggregation core: TTL-cached feed fetching fanned out across a user's
//! subscriptions, plus a second cache of article text scraped from the web.
//!
//! - [`feed`] - feed parsing, fetching and the feed cache
//! - [`content`] - HTML extraction, sanitization, the content cache and scraping
//! - [`aggregator`] - concurrent aggregation, ordering and pre-warm scheduling
//! - [`prewarm`] - the bounded background pool that fills the content cache
//! - [`config`] - TOML configuration

pub mod aggregator;
pub mod config;
pub mod content;
pub mod feed;
pub mod prewarm;
pub mod types;
pub mod util;
