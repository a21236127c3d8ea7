//! Configuration file parser for ~/.config/feedhub/config.toml.
//!
//! The config file is optional: a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning for each one so
//! typos do not go unnoticed.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Tunables for the caches, fetchers and the pre-warm pool.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seconds a fetched feed stays fresh in the feed cache.
    pub feed_cache_ttl_secs: u64,

    /// Seconds scraped article text stays fresh in the content cache.
    pub content_cache_ttl_secs: u64,

    /// Maximum number of entries held by the content cache.
    pub content_cache_capacity: usize,

    /// Overall deadline for a single feed fetch.
    pub feed_timeout_secs: u64,

    /// Overall deadline for a single article page fetch.
    pub scrape_timeout_secs: u64,

    /// TCP connect + TLS handshake deadline shared by both HTTP clients.
    pub connect_timeout_secs: u64,

    /// Aggregation output is truncated to this many articles.
    pub max_articles: usize,

    /// How many of the newest aggregated articles get pre-warmed.
    pub prewarm_count: usize,

    /// Worker tasks draining the pre-warm queue.
    pub prewarm_workers: usize,

    /// Pending pre-warm jobs allowed before new submissions are dropped.
    pub prewarm_queue: usize,

    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feed_cache_ttl_secs: 60,
            content_cache_ttl_secs: 30 * 60,
            content_cache_capacity: 2048,
            feed_timeout_secs: 30,
            scrape_timeout_secs: 10,
            connect_timeout_secs: 10,
            max_articles: 50,
            prewarm_count: 10,
            prewarm_workers: 4,
            prewarm_queue: 64,
            user_agent: concat!("feedhub/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 11] = [
        "feed_cache_ttl_secs",
        "content_cache_ttl_secs",
        "content_cache_capacity",
        "feed_timeout_secs",
        "scrape_timeout_secs",
        "connect_timeout_secs",
        "max_articles",
        "prewarm_count",
        "prewarm_workers",
        "prewarm_queue",
        "user_agent",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            feed_ttl_secs = config.feed_cache_ttl_secs,
            content_ttl_secs = config.content_cache_ttl_secs,
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn feed_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_cache_ttl_secs)
    }

    pub fn content_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.content_cache_ttl_secs)
    }

    pub fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.feed_timeout_secs)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("feedhub_config_test_{name}"));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.content_cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.feed_timeout(), Duration::from_secs(30));
        assert_eq!(config.scrape_timeout(), Duration::from_secs(10));
        assert_eq!(config.max_articles, 50);
        assert_eq!(config.prewarm_count, 10);
        assert!(config.user_agent.starts_with("feedhub/"));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/feedhub_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.max_articles, 50);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let path = write_config("whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_cache_ttl_secs, 60);
        cleanup(&path);
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let path = write_config("partial", "feed_cache_ttl_secs = 5\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.content_cache_ttl_secs, 1800);
        assert_eq!(config.prewarm_workers, 4);
        cleanup(&path);
    }

    #[test]
    fn test_full_config() {
        let content = r#"
feed_cache_ttl_secs = 120
content_cache_ttl_secs = 600
content_cache_capacity = 16
feed_timeout_secs = 5
scrape_timeout_secs = 3
connect_timeout_secs = 2
max_articles = 20
prewarm_count = 4
prewarm_workers = 1
prewarm_queue = 8
user_agent = "test-agent"
"#;
        let path = write_config("full", content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_cache_ttl_secs, 120);
        assert_eq!(config.content_cache_ttl_secs, 600);
        assert_eq!(config.content_cache_capacity, 16);
        assert_eq!(config.feed_timeout(), Duration::from_secs(5));
        assert_eq!(config.scrape_timeout(), Duration::from_secs(3));
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
        assert_eq!(config.max_articles, 20);
        assert_eq!(config.prewarm_count, 4);
        assert_eq!(config.prewarm_workers, 1);
        assert_eq!(config.prewarm_queue, 8);
        assert_eq!(config.user_agent, "test-agent");
        cleanup(&path);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let path = write_config("invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        cleanup(&path);
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let path = write_config("unknown", "max_articles = 10\nmystery = true\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.max_articles, 10);
        cleanup(&path);
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let path = write_config("wrongtype", "max_articles = \"lots\"\n");
        assert!(Config::load(&path).is_err());
        cleanup(&path);
    }

    #[test]
    fn test_too_large_file_rejected() {
        let path = write_config("too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        cleanup(&path);
    }
}
