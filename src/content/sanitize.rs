//! HTML fragment to plain, paragraph-structured text.
//!
//! The stages run in a fixed order. Script/style and boilerplate blocks are
//! removed while their tags still delimit them; only then are block tags
//! turned into line breaks and the remaining tags dropped.

use regex::{Captures, Regex};
use std::sync::LazyLock;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("sanitizer patterns are valid")
}

static SCRIPT: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<script\b[^>]*>.*?</script\s*>"));
static STYLE: LazyLock<Regex> = LazyLock::new(|| re(r"(?is)<style\b[^>]*>.*?</style\s*>"));
static COMMENT: LazyLock<Regex> = LazyLock::new(|| re(r"(?s)<!--.*?-->"));

/// Navigation, chrome and ad blocks, removed with their content.
static BOILERPLATE: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        re(r"(?is)<nav\b[^>]*>.*?</nav\s*>"),
        re(r"(?is)<header\b[^>]*>.*?</header\s*>"),
        re(r"(?is)<footer\b[^>]*>.*?</footer\s*>"),
        re(
            r#"(?is)<div\b[^>]*\bclass\s*=\s*["'][^"']*(?:nav|menu|sidebar|advertisement|ads)[^"']*["'][^>]*>.*?</div\s*>"#,
        ),
    ]
});

static LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<br\s*/?>"));
static BLOCK_CLOSE: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)</(?:p|div|h[1-6])\s*>"));
static HEADING_OPEN: LazyLock<Regex> = LazyLock::new(|| re(r"(?i)<h[1-6]\b[^>]*>"));
static ANY_TAG: LazyLock<Regex> = LazyLock::new(|| re(r"<[^>]+>"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| re(r"&(?:amp|lt|gt|quot|#39|nbsp);"));

static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| re(r"[ \t\r\x0B\x0C\u{00A0}]+"));
static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| re(r"\n{3,}"));
static ANY_WS: LazyLock<Regex> = LazyLock::new(|| re(r"\s+"));

/// Converts an HTML fragment into readable plain text.
///
/// # Examples
///
/// ```
/// use feedhub::content::sanitize;
///
/// let text = sanitize("<p>One &amp; two</p><script>x()</script><p>Three</p>");
/// assert_eq!(text, "One & two\n\nThree");
/// ```
pub fn sanitize(html: &str) -> String {
    let text = SCRIPT.replace_all(html, "");
    let text = STYLE.replace_all(&text, "");
    let text = COMMENT.replace_all(&text, "");

    let mut text = text.into_owned();
    for pattern in BOILERPLATE.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }

    let text = LINE_BREAK.replace_all(&text, "\n");
    let text = BLOCK_CLOSE.replace_all(&text, "\n\n");
    let text = HEADING_OPEN.replace_all(&text, "\n\n");
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);

    normalize_whitespace(&text)
}

/// Plain single-line text of a small fragment: tags dropped, entities
/// decoded, every whitespace run (newlines included) folded to one space.
pub(crate) fn inline_text(html: &str) -> String {
    let text = ANY_TAG.replace_all(html, " ");
    let text = decode_entities(&text);
    ANY_WS.replace_all(&text, " ").trim().to_string()
}

/// Decodes the fixed entity set in a single left-to-right pass, so `&amp;lt;`
/// becomes `&lt;` rather than `<`.
pub(crate) fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| match &caps[0] {
            "&amp;" => "&",
            "&lt;" => "<",
            "&gt;" => ">",
            "&quot;" => "\"",
            "&#39;" => "'",
            _ => " ",
        })
        .into_owned()
}

fn normalize_whitespace(text: &str) -> String {
    let text = HORIZONTAL_WS.replace_all(text, " ");
    let lines: Vec<&str> = text.split('\n').map(str::trim).collect();
    let text = lines.join("\n");
    EXCESS_NEWLINES
        .replace_all(&text, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_script_and_style_content_removed() {
        let html = "<p>Keep</p><script type=\"text/javascript\">var leaked = 1;</script>\
                    <style>.x { color: red }</style><p>Also keep</p>";
        assert_eq!(sanitize(html), "Keep\n\nAlso keep");
    }

    #[test]
    fn test_multiline_script_removed() {
        let html = "before<SCRIPT>\nline one\nline two\n</SCRIPT>after";
        assert_eq!(sanitize(html), "beforeafter");
    }

    #[test]
    fn test_comments_removed() {
        assert_eq!(sanitize("a<!-- hidden\nnote -->b"), "ab");
    }

    #[test]
    fn test_boilerplate_blocks_removed() {
        let html = r#"<header>Site title</header>
<nav><a href="/">Home</a></nav>
<div class="main-menu">Menu items</div>
<div class="sidebar left">Recent posts</div>
<div class="advertisement">Buy now</div>
<p>Actual story</p>
<footer>Copyright</footer>"#;
        assert_eq!(sanitize(html), "Actual story");
    }

    #[test]
    fn test_block_tags_become_paragraphs() {
        let html = "<h1>Title</h1><p>First paragraph</p><div>Second<br>line</div>";
        assert_eq!(sanitize(html), "Title\n\nFirst paragraph\n\nSecond\nline");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(
            sanitize("Tom &amp; Jerry &lt;3 &quot;cheese&quot; it&#39;s&nbsp;here &gt;"),
            "Tom & Jerry <3 \"cheese\" it's here >"
        );
    }

    #[test]
    fn test_entities_decoded_once() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_whitespace_collapsed() {
        let html = "  one \t  two  \n\n\n\n   three   \n \n \n four  ";
        assert_eq!(sanitize(html), "one two\n\nthree\n\nfour");
    }

    #[test]
    fn test_inline_text() {
        assert_eq!(
            inline_text("<b>Bold</b>\n  and <i>more</i> &amp; stuff "),
            "Bold and more & stuff"
        );
    }

    #[test]
    fn test_escaped_markup_is_not_idempotent() {
        // Entities decode after tag stripping, so escaped tags survive one
        // pass as real tags and are stripped by the next
        let once = sanitize("&lt;b&gt;x");
        assert_eq!(once, "<b>x");
        assert_eq!(sanitize(&once), "x");
    }

    /// Generator alphabet for the properties below. Escaped markup
    /// (`&lt;`, `&gt;`, `&amp;`) is left out: see
    /// `test_escaped_markup_is_not_idempotent`.
    fn html_token() -> impl Strategy<Value = &'static str> {
        prop::sample::select(vec![
            "word", "Other", "x", "42", " ", "  ", "\t", "\n", "\n\n\n", "<p>", "</p>", "<br/>",
            "<b>", "</b>", "<div class=\"body\">", "</div>", "<h2>", "</h2>", "&nbsp;",
            "&quot;", "&#39;", "<!-- note -->", "<script>bad()</script>", "<nav>links</nav>",
        ])
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(tokens in prop::collection::vec(html_token(), 0..40)) {
            let html: String = tokens.concat();
            let once = sanitize(&html);
            let twice = sanitize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn sanitize_output_has_no_tags(tokens in prop::collection::vec(html_token(), 0..40)) {
            let html: String = tokens.concat();
            let out = sanitize(&html);
            prop_assert!(!out.contains('<'));
            prop_assert!(!out.contains("\n\n\n"));
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}
