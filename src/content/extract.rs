//! Main-content selection and the title/meta fallback.
//!
//! Pattern matching against a small fixed rule set rather than a DOM walk.
//! The thresholds below decide which block counts as "the article" and must
//! not drift: callers rely on them for consistent results across pages.

use regex::Regex;
use std::sync::LazyLock;

use super::sanitize::{decode_entities, inline_text};

/// A candidate block is accepted only if its inner HTML is longer than this.
pub const MIN_BLOCK_LEN: usize = 100;

/// Fallback paragraphs must have between these many characters of plain text.
const FALLBACK_PARAGRAPH_MIN: usize = 20;
const FALLBACK_PARAGRAPH_MAX: usize = 200;
const FALLBACK_MAX_PARAGRAPHS: usize = 3;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extractor patterns are valid")
}

fn class_div(needle: &str) -> Regex {
    re(&format!(
        r#"(?is)<div\b[^>]*\bclass\s*=\s*["'][^"']*{needle}[^"']*["'][^>]*>(.*?)</div\s*>"#
    ))
}

/// Candidate containers in priority order.
static MAIN_CANDIDATES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        ("article", re(r"(?is)<article\b[^>]*>(.*?)</article\s*>")),
        ("div.content", class_div("content")),
        ("div.post", class_div("post")),
        ("div.entry", class_div("entry")),
        ("div.main", class_div("main")),
        ("main", re(r"(?is)<main\b[^>]*>(.*?)</main\s*>")),
    ]
});

static BODY: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<body\b[^>]*>(.*?)</body\s*>"));

static TITLE: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<title\b[^>]*>(.*?)</title\s*>"));
static META_DESCRIPTION: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        re(r#"(?is)<meta\b[^>]*\bname\s*=\s*["']description["'][^>]*\bcontent\s*=\s*"([^"]*)""#),
        re(r#"(?is)<meta\b[^>]*\bcontent\s*=\s*"([^"]*)"[^>]*\bname\s*=\s*["']description["']"#),
    ]
});
static PARAGRAPH: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<p\b[^>]*>(.*?)</p\s*>"));

/// Selects the HTML fragment most likely to hold the article body.
///
/// Tries `<article>`, then divs whose class mentions content/post/entry/main,
/// then `<main>`, accepting the first block longer than [`MIN_BLOCK_LEN`].
/// Falls back to the `<body>` contents, and to the whole document when there
/// is no body either.
pub fn extract_main_content(html: &str) -> &str {
    for (name, pattern) in MAIN_CANDIDATES.iter() {
        let accepted = pattern
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .find(|inner| inner.as_str().chars().count() > MIN_BLOCK_LEN);
        if let Some(inner) = accepted {
            tracing::trace!(candidate = %name, len = inner.len(), "Selected main content block");
            return inner.as_str();
        }
    }

    match BODY.captures(html).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str(),
        None => html,
    }
}

/// Builds a short summary from the page title, meta description and up to
/// three mid-sized paragraphs, separated by blank lines.
pub fn extract_fallback(html: &str) -> String {
    let mut parts = Vec::new();

    if let Some(title) = TITLE.captures(html).and_then(|caps| caps.get(1)) {
        let title = inline_text(title.as_str());
        if !title.is_empty() {
            parts.push(title);
        }
    }

    let description = META_DESCRIPTION
        .iter()
        .find_map(|pattern| pattern.captures(html).and_then(|caps| caps.get(1)));
    if let Some(description) = description {
        let description = decode_entities(description.as_str()).trim().to_string();
        if !description.is_empty() {
            parts.push(description);
        }
    }

    parts.extend(
        PARAGRAPH
            .captures_iter(html)
            .filter_map(|caps| caps.get(1))
            .map(|inner| inline_text(inner.as_str()))
            .filter(|text| {
                let len = text.chars().count();
                (FALLBACK_PARAGRAPH_MIN..=FALLBACK_PARAGRAPH_MAX).contains(&len)
            })
            .take(FALLBACK_MAX_PARAGRAPHS),
    );

    parts.join("\n\n")
}
