use serde::Serialize;

/// A subscribed feed as supplied by the subscription store.
///
/// Identity is the URL. The core never validates or mutates these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub url: String,
    pub active: bool,
}

impl FeedSource {
    pub fn new(url: impl Into<String>, active: bool) -> Self {
        Self {
            url: url.into(),
            active,
        }
    }
}

/// A single feed item as seen by the aggregation layer.
///
/// Identity is `link`, but uniqueness is not enforced: two feeds carrying the
/// same item produce two entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// `YYYY-MM-DD HH:MM` (UTC) when the feed supplied a parseable date, empty otherwise.
    /// The normalized form sorts lexicographically in chronological order.
    pub published_at: String,
    /// Display name of the feed the item came from
    pub source: String,
    /// Raw HTML snippet from the feed
    pub description: String,
    /// Owned by the favorites store, merged in after aggregation
    pub is_favorite: bool,
}
