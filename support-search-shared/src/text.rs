//! Plain-text helpers for document preparation and result summaries.

use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_OR_STYLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)\s*>").expect("static regex"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Convert rendered HTML into indexable plain text.
///
/// Drops `<script>`/`<style>` bodies and every tag, decodes the common named
/// entities and collapses runs of whitespace.
pub fn strip_html(html: &str) -> String {
    let without_code = SCRIPT_OR_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_code, " ");
    let decoded = decode_entities(&without_tags);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

/// Remove every tag, keeping the text between them as is.
pub fn remove_tags(text: &str) -> String {
    TAG.replace_all(text, "").into_owned()
}

/// Decode the handful of entities produced by the wiki renderer.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Escape text for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Return at most `max_chars` characters of `text`, never splitting a
/// multi-byte character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        let html = "<h1>Reset&nbsp;your password</h1>\n<p>Click <a href=\"#\">here</a> &amp; go.</p><script>alert(1)</script>";
        assert_eq!(strip_html(html), "Reset your password Click here & go.");
    }

    #[test]
    fn test_strip_html_plain_text_untouched() {
        assert_eq!(strip_html("just text"), "just text");
    }

    #[test]
    fn test_remove_tags_keeps_spacing() {
        assert_eq!(remove_tags("To <b>reset</b> it "), "To reset it ");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        assert_eq!(truncate_chars("重置密码", 2), "重置");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }
}
