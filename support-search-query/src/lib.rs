//! # Support Search Query
//!
//! Compound full-text search over the support site indices. A validated
//! `SearchRequest` selects content kinds, a locale, an optional product and
//! a page; `CompoundSearch` turns it into one engine query and maps the
//! hits back into typed results with sanitized summaries.

pub mod config;
pub mod dsl;
pub mod engine;
pub mod errors;
pub mod form;
pub mod hit;
pub mod kinds;
pub mod pagination;
pub mod results;
pub mod summary;

pub use config::{config_for, ForumQuery, ProfileQuery, QueryConfig, QuestionQuery, WikiQuery};
pub use engine::CompoundSearch;
pub use errors::{ApiError, QueryError};
pub use form::{SearchForm, SearchRequest};
pub use hit::{Hit, SearchHits};
pub use kinds::{SearchKind, DEFAULT_MASK};
pub use pagination::{Pagination, PAGE_SIZE};
pub use results::{SearchResponse, SearchResult};
