use crate::config::Config;
use crate::feed::parser::parse_feed;
use crate::types::Article;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Keep idle upstream connections around between refreshes.
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

/// Errors that can occur while fetching a single feed.
///
/// None of these reach the aggregation caller: [`FeedFetcher`] logs them and
/// degrades to an empty article list.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The whole fetch exceeded its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Feed XML could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Source of per-feed article lists.
///
/// Implementations must never fail: any error is logged and reported as an
/// empty list so that one broken feed cannot sink an aggregation.
pub trait FeedLoader: Send + Sync + 'static {
    fn load(&self, feed_url: &str) -> impl Future<Output = Vec<Article>> + Send;
}

/// HTTP feed fetcher with a dedicated client and a hard per-call deadline.
#[derive(Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl FeedFetcher {
    /// Builds a fetcher whose client has connect (TCP + TLS handshake) and
    /// keep-alive settings taken from `config`.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout())
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .tcp_keepalive(TCP_KEEPALIVE)
            .build()?;
        Ok(Self::with_client(client, config.feed_timeout()))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetches and parses one feed, surfacing the failure reason.
    ///
    /// The deadline covers the request, the body read and nothing else;
    /// parsing happens after the timer has been dropped.
    pub async fn fetch_feed(&self, feed_url: &str) -> Result<Vec<Article>, FetchError> {
        let bytes = tokio::time::timeout(self.timeout, self.download(feed_url))
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))??;

        parse_feed(feed_url, &bytes).map_err(|e| FetchError::Parse(e.to_string()))
    }

    async fn download(&self, feed_url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(feed_url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_FEED_SIZE).await
    }
}

impl FeedLoader for FeedFetcher {
    async fn load(&self, feed_url: &str) -> Vec<Article> {
        match self.fetch_feed(feed_url).await {
            Ok(articles) => {
                tracing::debug!(feed = %feed_url, count = articles.len(), "Fetched feed");
                articles
            }
            Err(e) => {
                tracing::warn!(
                    feed = %feed_url,
                    error = %e,
                    "Feed fetch failed, contributing no articles"
                );
                Vec::new()
            }
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test Feed</title>
    <item><guid>1</guid><title>Test</title><link>https://example.com/1</link></item>
</channel></rss>"#;

    fn fetcher(timeout: Duration) -> FeedFetcher {
        FeedFetcher::with_client(reqwest::Client::new(), timeout)
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .insert_header("Content-Type", "application/xml"),
            )
            .mount(&mock_server)
            .await;

        let articles = fetcher(Duration::from_secs(5))
            .fetch_feed(&format!("{}/feed", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Test");
        assert_eq!(articles[0].source, "Test Feed");
    }

    #[tokio::test]
    async fn test_404_is_http_status_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        match fetcher(Duration::from_secs(5)).fetch_feed(&url).await {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other.map(|a| a.len())),
        }

        // The loader path swallows the error
        assert!(fetcher(Duration::from_secs(5)).load(&url).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_feed_parse_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<not valid xml"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let result = fetcher(Duration::from_secs(5)).fetch_feed(&url).await;
        assert!(matches!(result, Err(FetchError::Parse(_))));
        assert!(fetcher(Duration::from_secs(5)).load(&url).await.is_empty());
    }

    #[tokio::test]
    async fn test_slow_feed_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(VALID_RSS)
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let started = std::time::Instant::now();
        let result = fetcher(Duration::from_millis(300)).fetch_feed(&url).await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_empty_feed_success() {
        let empty_rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Empty</title></channel></rss>"#;

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(empty_rss))
            .mount(&mock_server)
            .await;

        let url = format!("{}/feed", mock_server.uri());
        let articles = fetcher(Duration::from_secs(5)).fetch_feed(&url).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Nothing listens on port 9 of the loopback interface
        let result = fetcher(Duration::from_secs(5))
            .fetch_feed("http://127.0.0.1:9/feed")
            .await;
        assert!(matches!(result, Err(FetchError::Network(_))));
    }
}
