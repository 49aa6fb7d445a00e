//! Result summaries.
//!
//! A summary is the first highlighted fragment, else the plain summary of
//! the request locale, else the start of the content. Whatever is chosen is
//! reduced to escaped text in which only the highlight tags survive.

use support_search_shared::text::{escape_html, remove_tags, truncate_chars};

use crate::hit::Hit;

pub const HIGHLIGHT_PRE_TAG: &str = "<mark>";
pub const HIGHLIGHT_POST_TAG: &str = "</mark>";

/// Characters of content used when nothing better exists.
pub const CONTENT_SUMMARY_CHARS: usize = 500;

/// Where a kind's summary comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarySources {
    /// Highlighted fields, in order of preference.
    pub highlight_fields: Vec<String>,
    /// Plain summary field, if the kind has one.
    pub summary_field: Option<String>,
    pub content_field: String,
}

/// Pick and sanitize the summary of `hit`.
pub fn summarize(hit: &Hit, sources: &SummarySources) -> String {
    if let Some(fragment) = sources
        .highlight_fields
        .iter()
        .find_map(|field| hit.fragment(field))
    {
        return sanitize(fragment);
    }

    if let Some(summary) = sources
        .summary_field
        .as_deref()
        .and_then(|field| hit.text(field))
    {
        return sanitize_plain(summary);
    }

    hit.text(&sources.content_field)
        .map(|content| sanitize_plain(truncate_chars(content, CONTENT_SUMMARY_CHARS)))
        .unwrap_or_default()
}

/// Escape `text`, keeping only the highlight tags as markup.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    loop {
        let next = [HIGHLIGHT_PRE_TAG, HIGHLIGHT_POST_TAG]
            .into_iter()
            .filter_map(|tag| rest.find(tag).map(|position| (position, tag)))
            .min_by_key(|(position, _)| *position);
        match next {
            Some((position, tag)) => {
                out.push_str(&sanitize_plain(&rest[..position]));
                out.push_str(tag);
                rest = &rest[position + tag.len()..];
            }
            None => {
                out.push_str(&sanitize_plain(rest));
                return out;
            }
        }
    }
}

fn sanitize_plain(text: &str) -> String {
    escape_html(&remove_tags(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn hit(source: serde_json::Value, highlight: serde_json::Value) -> Hit {
        Hit {
            index: "dev_wiki_document".to_string(),
            id: "1".to_string(),
            score: 1.0,
            source,
            highlight: highlight.as_object().cloned().unwrap_or_else(Map::new),
        }
    }

    fn wiki_sources() -> SummarySources {
        SummarySources {
            highlight_fields: vec!["summary.en-US".to_string(), "content.en-US".to_string()],
            summary_field: Some("summary.en-US".to_string()),
            content_field: "content.en-US".to_string(),
        }
    }

    #[test]
    fn test_fallback_order() {
        let source = json!({
            "summary": { "en-US": "Plain summary" },
            "content": { "en-US": "Long content" }
        });

        let highlighted = hit(
            source.clone(),
            json!({ "content.en-US": ["Long <mark>content</mark>"] }),
        );
        assert_eq!(summarize(&highlighted, &wiki_sources()), "Long <mark>content</mark>");

        let plain = hit(source, json!({}));
        assert_eq!(summarize(&plain, &wiki_sources()), "Plain summary");

        let content_only = hit(json!({ "content": { "en-US": "x".repeat(600) } }), json!({}));
        assert_eq!(summarize(&content_only, &wiki_sources()).len(), CONTENT_SUMMARY_CHARS);

        assert_eq!(summarize(&hit(json!({}), json!({})), &wiki_sources()), "");
    }

    #[test]
    fn test_highlight_field_order_wins() {
        let both = hit(
            json!({}),
            json!({
                "content.en-US": ["from <mark>content</mark>"],
                "summary.en-US": ["from <mark>summary</mark>"]
            }),
        );
        assert_eq!(summarize(&both, &wiki_sources()), "from <mark>summary</mark>");
    }

    #[test]
    fn test_sanitize_keeps_only_highlight_tags() {
        assert_eq!(
            sanitize("<b>Reset</b> <mark>password</mark> & <script>x</script>"),
            "Reset <mark>password</mark> &amp; x"
        );
        assert_eq!(sanitize("a < b"), "a &lt; b");
    }
}
