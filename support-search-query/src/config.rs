//! Per-kind query configuration.
//!
//! Each `QueryConfig` knows one index: which fields to search and with what
//! weight, what marks a document of its kind, how a product narrows it and
//! how a hit becomes a `SearchResult`.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use support_search_shared::indices::{
    FORUM_INDEX, PROFILE_INDEX, QUESTION_INDEX, WIKI_DOCUMENT_INDEX,
};
use support_search_shared::{Locale, Product};

use crate::errors::QueryError;
use crate::hit::Hit;
use crate::kinds::SearchKind;
use crate::results::SearchResult;
use crate::summary::{summarize, SummarySources};

/// Search behavior of one kind of content.
pub trait QueryConfig: Send + Sync {
    fn kind(&self) -> SearchKind;

    /// Logical index name.
    fn index(&self) -> &'static str;

    /// Weighted full-text fields for `locale`, as `field^boost`.
    fn fields(&self, locale: &Locale) -> Vec<String>;

    /// Fields to highlight, in order of preference for the summary.
    fn highlight_fields(&self, locale: &Locale) -> Vec<String>;

    /// Filter matching the documents of this kind in `index`.
    fn type_filter(&self, index: &str, _locale: &Locale) -> Value {
        json!({ "term": { "_index": index } })
    }

    /// Filter restricting this kind to `product`, if it can be restricted.
    fn product_filter(&self, _product: &Product) -> Option<Value> {
        None
    }

    fn summary_sources(&self, locale: &Locale) -> SummarySources;

    /// Turn a hit from this kind's index into a result.
    fn make_result(&self, hit: &Hit, locale: &Locale) -> Result<SearchResult, QueryError>;
}

/// The configuration of `kind`.
pub fn config_for(kind: SearchKind) -> &'static dyn QueryConfig {
    match kind {
        SearchKind::Wiki => &WikiQuery,
        SearchKind::Question => &QuestionQuery,
        SearchKind::Forum => &ForumQuery,
        SearchKind::Profile => &ProfileQuery,
    }
}

fn localized(field: &str, locale: &Locale) -> String {
    format!("{}.{}", field, locale.as_str())
}

fn weighted(field: String, boost: u32) -> String {
    if boost == 1 {
        field
    } else {
        format!("{}^{}", field, boost)
    }
}

/// Knowledge base articles.
#[derive(Debug, Clone, Copy, Default)]
pub struct WikiQuery;

impl QueryConfig for WikiQuery {
    fn kind(&self) -> SearchKind {
        SearchKind::Wiki
    }

    fn index(&self) -> &'static str {
        WIKI_DOCUMENT_INDEX
    }

    fn fields(&self, locale: &Locale) -> Vec<String> {
        [("keywords", 8), ("title", 6), ("summary", 4), ("content", 2)]
            .into_iter()
            .map(|(field, boost)| weighted(localized(field, locale), boost))
            .collect()
    }

    fn highlight_fields(&self, locale: &Locale) -> Vec<String> {
        vec![localized("summary", locale), localized("content", locale)]
    }

    /// Articles with a translation for the locale that are not archived.
    /// `locale` is written by the parent article only, so a document holding
    /// nothing but translations never matches.
    fn type_filter(&self, index: &str, locale: &Locale) -> Value {
        json!({
            "bool": {
                "filter": [
                    { "term": { "_index": index } },
                    { "exists": { "field": "locale" } },
                    { "exists": { "field": localized("title", locale) } }
                ],
                "must_not": [{ "term": { "is_archived": true } }]
            }
        })
    }

    fn product_filter(&self, product: &Product) -> Option<Value> {
        Some(json!({ "terms": { "product_ids": [product.id] } }))
    }

    fn summary_sources(&self, locale: &Locale) -> SummarySources {
        SummarySources {
            highlight_fields: self.highlight_fields(locale),
            summary_field: Some(localized("summary", locale)),
            content_field: localized("content", locale),
        }
    }

    fn make_result(&self, hit: &Hit, locale: &Locale) -> Result<SearchResult, QueryError> {
        let slug = hit.require_text(&localized("slug", locale))?;
        Ok(SearchResult::Document {
            url: format!("/{}/kb/{}", locale, slug),
            score: hit.score,
            title: hit
                .text(&localized("title", locale))
                .unwrap_or_default()
                .to_string(),
            search_summary: summarize(hit, &self.summary_sources(locale)),
        })
    }
}

/// Support questions.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuestionQuery;

impl QueryConfig for QuestionQuery {
    fn kind(&self) -> SearchKind {
        SearchKind::Question
    }

    fn index(&self) -> &'static str {
        QUESTION_INDEX
    }

    fn fields(&self, locale: &Locale) -> Vec<String> {
        [
            ("question_title", 4),
            ("question_content", 3),
            ("answer_content", 3),
        ]
        .into_iter()
        .map(|(field, boost)| weighted(localized(field, locale), boost))
        .collect()
    }

    fn highlight_fields(&self, locale: &Locale) -> Vec<String> {
        vec![
            localized("question_content", locale),
            localized("answer_content", locale),
        ]
    }

    /// Questions asked in the locale that are not spam.
    fn type_filter(&self, index: &str, locale: &Locale) -> Value {
        json!({
            "bool": {
                "filter": [
                    { "term": { "_index": index } },
                    { "term": { "locale": locale.as_str() } }
                ],
                "must_not": [{ "term": { "question_is_spam": true } }]
            }
        })
    }

    fn product_filter(&self, product: &Product) -> Option<Value> {
        Some(json!({ "term": { "question_product_id": product.id } }))
    }

    fn summary_sources(&self, locale: &Locale) -> SummarySources {
        SummarySources {
            highlight_fields: self.highlight_fields(locale),
            summary_field: None,
            content_field: localized("question_content", locale),
        }
    }

    fn make_result(&self, hit: &Hit, locale: &Locale) -> Result<SearchResult, QueryError> {
        let last_updated = hit
            .text("question_updated")
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
            .map(|date| date.with_timezone(&Utc));

        Ok(SearchResult::Question {
            url: format!("/{}/questions/{}", locale, hit.id),
            score: hit.score,
            title: hit
                .text(&localized("question_title", locale))
                .unwrap_or_default()
                .to_string(),
            search_summary: summarize(hit, &self.summary_sources(locale)),
            is_solved: hit.flag("question_has_solution"),
            num_answers: hit.integer("question_num_answers").unwrap_or(0),
            num_votes: hit.integer("question_num_votes").unwrap_or(0),
            last_updated,
        })
    }
}

/// Contributor forum posts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForumQuery;

impl QueryConfig for ForumQuery {
    fn kind(&self) -> SearchKind {
        SearchKind::Forum
    }

    fn index(&self) -> &'static str {
        FORUM_INDEX
    }

    fn fields(&self, _locale: &Locale) -> Vec<String> {
        vec![weighted("thread_title".to_string(), 2), "content".to_string()]
    }

    fn highlight_fields(&self, _locale: &Locale) -> Vec<String> {
        vec!["content".to_string()]
    }

    fn summary_sources(&self, locale: &Locale) -> SummarySources {
        SummarySources {
            highlight_fields: self.highlight_fields(locale),
            summary_field: None,
            content_field: "content".to_string(),
        }
    }

    fn make_result(&self, hit: &Hit, locale: &Locale) -> Result<SearchResult, QueryError> {
        let forum_slug = hit.require_text("forum_slug")?;
        let thread_id = hit.integer("thread_id").ok_or_else(|| {
            QueryError::malformed(format!("forum post {} has no thread_id", hit.id))
        })?;

        Ok(SearchResult::Thread {
            url: format!("/{}/forums/{}/{}#post-{}", locale, forum_slug, thread_id, hit.id),
            score: hit.score,
            title: hit.text("thread_title").unwrap_or_default().to_string(),
            search_summary: summarize(hit, &self.summary_sources(locale)),
            forum_slug: forum_slug.to_string(),
        })
    }
}

/// User profiles.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileQuery;

impl QueryConfig for ProfileQuery {
    fn kind(&self) -> SearchKind {
        SearchKind::Profile
    }

    fn index(&self) -> &'static str {
        PROFILE_INDEX
    }

    fn fields(&self, _locale: &Locale) -> Vec<String> {
        vec![weighted("username".to_string(), 2), "name".to_string()]
    }

    fn highlight_fields(&self, _locale: &Locale) -> Vec<String> {
        vec!["name".to_string()]
    }

    fn product_filter(&self, product: &Product) -> Option<Value> {
        Some(json!({ "terms": { "product_ids": [product.id] } }))
    }

    fn summary_sources(&self, locale: &Locale) -> SummarySources {
        SummarySources {
            highlight_fields: self.highlight_fields(locale),
            summary_field: None,
            content_field: "name".to_string(),
        }
    }

    fn make_result(&self, hit: &Hit, locale: &Locale) -> Result<SearchResult, QueryError> {
        let username = hit.require_text("username")?;
        Ok(SearchResult::User {
            url: format!("/{}/user/{}", locale, username),
            score: hit.score,
            title: hit.text("name").unwrap_or(username).to_string(),
            search_summary: summarize(hit, &self.summary_sources(locale)),
            username: username.to_string(),
        })
    }
}
