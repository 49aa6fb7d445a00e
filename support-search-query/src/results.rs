//! User-facing result records and the search response body.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::pagination::Pagination;

/// One search result, tagged by `type` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SearchResult {
    /// A knowledge base article.
    #[serde(rename = "document")]
    Document {
        url: String,
        score: f64,
        title: String,
        search_summary: String,
    },
    #[serde(rename = "question")]
    Question {
        url: String,
        score: f64,
        title: String,
        search_summary: String,
        is_solved: bool,
        num_answers: i64,
        num_votes: i64,
        last_updated: Option<DateTime<Utc>>,
    },
    /// A forum post, presented as its thread.
    #[serde(rename = "thread")]
    Thread {
        url: String,
        score: f64,
        title: String,
        search_summary: String,
        forum_slug: String,
    },
    #[serde(rename = "user")]
    User {
        url: String,
        score: f64,
        title: String,
        search_summary: String,
        username: String,
    },
}

impl SearchResult {
    /// The JSON `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Document { .. } => "document",
            Self::Question { .. } => "question",
            Self::Thread { .. } => "thread",
            Self::User { .. } => "user",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Document { url, .. }
            | Self::Question { url, .. }
            | Self::Thread { url, .. }
            | Self::User { url, .. } => url,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Document { title, .. }
            | Self::Question { title, .. }
            | Self::Thread { title, .. }
            | Self::User { title, .. } => title,
        }
    }

    pub fn score(&self) -> f64 {
        match self {
            Self::Document { score, .. }
            | Self::Question { score, .. }
            | Self::Thread { score, .. }
            | Self::User { score, .. } => *score,
        }
    }

    pub fn search_summary(&self) -> &str {
        match self {
            Self::Document { search_summary, .. }
            | Self::Question { search_summary, .. }
            | Self::Thread { search_summary, .. }
            | Self::User { search_summary, .. } => search_summary,
        }
    }
}

/// Body returned to the search UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    /// Results on this page.
    pub num_results: usize,
    /// Matches across all pages.
    pub total: u64,
    pub results: Vec<SearchResult>,
    /// Popular articles offered when nothing matched, `null` otherwise.
    pub fallback_results: Option<Vec<SearchResult>>,
    pub product_titles: Vec<String>,
    pub q: String,
    pub w: u32,
    pub pagination: Pagination,
}
