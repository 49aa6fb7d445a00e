//! Error types for compound search.

use serde::Serialize;
use support_search_repository::SearchError;
use thiserror::Error;

/// Errors that can occur while answering a search request.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The request parameters are invalid.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The engine failed or could not be reached.
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// The engine answered with something that cannot be turned into results.
    #[error("Malformed search response: {0}")]
    Malformed(String),
}

impl QueryError {
    /// Create an invalid request error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a malformed response error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// HTTP status reported to the search UI.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) => 400,
            Self::Search(_) => 503,
            Self::Malformed(_) => 500,
        }
    }
}

/// The JSON error body returned to the search UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: u16,
    pub error: String,
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        let status = err.status_code();
        tracing::warn!(status_code = status, error = %err, "Search request failed");

        // Engine internals are not shown to users.
        let error = match err {
            QueryError::InvalidRequest(msg) => msg,
            QueryError::Search(_) => "Search is unavailable, please try again later.".to_string(),
            QueryError::Malformed(_) => "Search failed.".to_string(),
        };
        Self { status, error }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(QueryError::invalid("page").status_code(), 400);
        assert_eq!(QueryError::from(SearchError::timeout("slow")).status_code(), 503);
        assert_eq!(QueryError::malformed("no hits").status_code(), 500);
    }

    #[test]
    fn test_api_error_body() {
        let api = ApiError::from(QueryError::invalid("q is required"));
        assert_eq!(api.status, 400);
        assert_eq!(serde_json::to_value(&api).unwrap(), json!({ "error": "q is required" }));

        let api = ApiError::from(QueryError::from(SearchError::connection("refused")));
        assert_eq!(api.status, 503);
        assert!(!api.error.contains("refused"));
    }
}
