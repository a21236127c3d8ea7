use feed_rs::parser;
use url::Url;

use crate::types::Article;
use crate::util::truncate_to_width;

/// Format stored in [`Article::published_at`]. Lexicographic order on this
/// format matches chronological order.
const PUBLISHED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Upper bound, in display columns, for labels derived from a channel URL.
const MAX_SOURCE_WIDTH: usize = 40;

/// Titles some platforms put on every channel feed; useless as a source name.
const GENERIC_TITLES: &[&str] = &["youtube", "videos", "uploads", "rss", "feed"];

/// Parses RSS/Atom bytes into articles in feed order.
///
/// `feed_url` is only used to derive the source label when the feed's own
/// title is missing or generic.
pub fn parse_feed(feed_url: &str, bytes: &[u8]) -> Result<Vec<Article>, parser::ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let feed_title = feed.title.map(|t| t.content);
    let source = source_label(feed_url, feed_title.as_deref());

    let articles = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let published_at = entry
                .published
                .or(entry.updated)
                .map(|dt| dt.format(PUBLISHED_FORMAT).to_string())
                .unwrap_or_default();
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .unwrap_or_default();
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string());

            Article {
                title,
                link,
                published_at,
                source: source.clone(),
                description,
                is_favorite: false,
            }
        })
        .collect();

    Ok(articles)
}

/// Picks the display name for a feed.
///
/// Channel feeds with a missing or generic title are labelled
/// `Channel <id>`; any other feed without a title falls back to the URL host.
pub fn source_label(feed_url: &str, feed_title: Option<&str>) -> String {
    let title = feed_title.map(str::trim).filter(|t| !t.is_empty());

    if let Some(channel) = channel_id(feed_url) {
        let generic = title.map_or(true, |t| {
            GENERIC_TITLES.iter().any(|g| t.eq_ignore_ascii_case(g))
        });
        if generic {
            let label = format!("Channel {channel}");
            return truncate_to_width(&label, MAX_SOURCE_WIDTH).into_owned();
        }
    }

    match title {
        Some(t) => t.to_string(),
        None => Url::parse(feed_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .map(|host| truncate_to_width(&host, MAX_SOURCE_WIDTH).into_owned())
            .unwrap_or_else(|| feed_url.to_string()),
    }
}

/// Extracts the channel identifier from `?channel_id=<id>` or `/channel/<id>`.
fn channel_id(feed_url: &str) -> Option<String> {
    let url = Url::parse(feed_url).ok()?;

    if let Some((_, id)) = url
        .query_pairs()
        .find(|(k, v)| k == "channel_id" && !v.is_empty())
    {
        return Some(id.into_owned());
    }

    let mut segments = url.path_segments()?;
    segments.find(|s| *s == "channel")?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
