use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use thiserror::Error;

use crate::config::Config;
use crate::content::cache::ContentCache;
use crate::content::extract::{extract_fallback, extract_main_content};
use crate::content::sanitize::sanitize;

const MAX_PAGE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Extracted text shorter than this triggers the title/meta fallback.
pub const MIN_CONTENT_CHARS: usize = 50;

/// The fallback must produce at least this much text or the scrape fails.
pub const MIN_FALLBACK_CHARS: usize = 20;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("content too short")]
    ContentTooShort,
}

/// Retrieves the raw HTML of an article page.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch_page(&self, url: &str) -> impl Future<Output = Result<String, ScrapeError>> + Send;
}

/// Plain GET with the client's default redirect policy and no auth headers.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpPageFetcher {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout())
            .build()?;
        Ok(Self::with_client(client, config.scrape_timeout()))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn download(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;

        if response.status() != reqwest::StatusCode::OK {
            return Err(ScrapeError::HttpStatus(response.status().as_u16()));
        }

        read_limited_text(response, MAX_PAGE_SIZE).await
    }
}

impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        tokio::time::timeout(self.timeout, self.download(url))
            .await
            .map_err(|_| ScrapeError::Timeout(self.timeout))?
    }
}

async fn read_limited_text(
    response: reqwest::Response,
    limit: usize,
) -> Result<String, ScrapeError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ScrapeError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ScrapeError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    // Pages in legacy encodings still yield usable text after replacement
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Turns a full HTML page into article text.
///
/// Runs main-content selection and sanitization; when that yields fewer than
/// [`MIN_CONTENT_CHARS`] characters, falls back to title, meta description and
/// leading paragraphs.
pub fn html_to_text(html: &str) -> Result<String, ScrapeError> {
    let text = sanitize(extract_main_content(html));
    if text.chars().count() >= MIN_CONTENT_CHARS {
        return Ok(text);
    }

    let fallback = extract_fallback(html);
    if fallback.chars().count() >= MIN_FALLBACK_CHARS {
        tracing::debug!(
            extracted = text.chars().count(),
            fallback = fallback.chars().count(),
            "Main content too short, using title/meta fallback"
        );
        return Ok(fallback);
    }

    Err(ScrapeError::ContentTooShort)
}

/// Cache-fronted article scraper.
pub struct ScrapeService<F> {
    fetcher: F,
    cache: ContentCache,
}

impl<F: PageFetcher> ScrapeService<F> {
    pub fn new(fetcher: F, cache: ContentCache) -> Self {
        Self { fetcher, cache }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Returns the readable text of `url`.
    ///
    /// A fresh successful cache entry is returned without touching the
    /// network. Failures are returned to the caller and never cached here, so
    /// a user-triggered retry always goes back to the network.
    pub async fn scrape(&self, url: &str) -> Result<String, ScrapeError> {
        if let Some(content) = self.cache.get_fresh(url).await {
            tracing::debug!(url = %url, "Content cache hit");
            return Ok(content);
        }

        let html = self.fetcher.fetch_page(url).await?;
        let content = html_to_text(&html)?;

        self.cache.store_success(url, content.clone()).await;
        tracing::debug!(url = %url, chars = content.chars().count(), "Scraped article");
        Ok(content)
    }

    /// Background variant used by the pre-warm pool.
    ///
    /// Skips URLs that already have a fresh entry (successful or not). On
    /// failure it records a failure entry so broken pages are not hammered,
    /// then hands the error back for logging.
    pub async fn prewarm(&self, url: &str) -> Result<PrewarmOutcome, ScrapeError> {
        if !self.cache.needs_refresh(url).await {
            return Ok(PrewarmOutcome::AlreadyCached);
        }

        match self.scrape(url).await {
            Ok(_) => Ok(PrewarmOutcome::Scraped),
            Err(e) => {
                self.cache.store_failure(url).await;
                Err(e)
            }
        }
    }
}

/// What a successful pre-warm call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrewarmOutcome {
    Scraped,
    AlreadyCached,
}
