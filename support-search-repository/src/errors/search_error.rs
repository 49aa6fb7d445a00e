//! Errors raised while talking to the search engine.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SearchError {
    /// The engine could not be reached or refused the request.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// No answer within the request timeout, or the engine reported one.
    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Index error: {0}")]
    IndexError(String),

    /// The bulk request was rejected as a whole. Per-item failures are
    /// reported in the bulk response instead.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    #[error("Update error: {0}")]
    UpdateError(String),

    #[error("Delete error: {0}")]
    DeleteError(String),

    #[error("Update by query error: {0}")]
    UpdateByQueryError(String),

    /// Creating or dropping an index failed.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// The engine answered with a body we could not read.
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl SearchError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryError(msg.into())
    }

    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    pub fn update(msg: impl Into<String>) -> Self {
        Self::UpdateError(msg.into())
    }

    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    pub fn update_by_query(msg: impl Into<String>) -> Self {
        Self::UpdateByQueryError(msg.into())
    }

    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Connection failures and timeouts; retrying may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ConnectionError(_) | Self::Timeout(_))
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
