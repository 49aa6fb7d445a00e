//! Error types for the indexing pipeline.

use std::fmt;

use support_search_repository::{BulkActionKind, BulkItemResult, SearchError};
use thiserror::Error;

/// One document the engine refused within a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemFailure {
    pub id: String,
    pub action: BulkActionKind,
    pub status: u16,
    pub reason: String,
}

impl From<BulkItemResult> for BulkItemFailure {
    fn from(item: BulkItemResult) -> Self {
        let reason = item
            .error
            .as_ref()
            .map(|error| {
                error
                    .get("reason")
                    .and_then(|reason| reason.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string())
            })
            .unwrap_or_else(|| format!("status {}", item.status));
        Self {
            id: item.id,
            action: item.action,
            status: item.status,
            reason,
        }
    }
}

impl fmt::Display for BulkItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({}): {}",
            self.action, self.id, self.status, self.reason
        )
    }
}

/// Errors that can occur in the indexing pipeline.
#[derive(Error, Debug)]
pub enum IndexingError {
    /// No document type is registered under this name.
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    /// Two document types claimed the same name or index.
    #[error("Duplicate document type: {0}")]
    DuplicateDocumentType(String),

    /// The field is not part of the document type's mapping.
    #[error("Unknown field {field} for document type {doc_type}")]
    UnknownField { doc_type: String, field: String },

    /// The relational source could not be read.
    #[error("Store error: {0}")]
    StoreError(String),

    /// The engine stayed unreachable after every retry.
    #[error("Transport failure after {attempts} attempts: {source}")]
    Transport { attempts: u32, source: SearchError },

    /// Some documents of a bulk request were refused.
    #[error("Bulk index error for {doc_type}: {} document(s) failed", .failures.len())]
    BulkIndex {
        doc_type: String,
        failures: Vec<BulkItemFailure>,
    },

    /// Error from the search engine.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// An option passed to the pipeline is out of range.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The job runner failed to run a job.
    #[error("Job error: {0}")]
    JobError(String),
}

impl IndexingError {
    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::StoreError(msg.into())
    }

    /// Create an invalid option error.
    pub fn invalid_option(msg: impl Into<String>) -> Self {
        Self::InvalidOption(msg.into())
    }

    /// Create a job error.
    pub fn job(msg: impl Into<String>) -> Self {
        Self::JobError(msg.into())
    }

    /// Whether re-running the whole job may succeed.
    ///
    /// Programmer errors such as unknown type or field names never are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::StoreError(_) | Self::JobError(_) => true,
            Self::SearchError(e) => e.is_transient(),
            Self::UnknownDocumentType(_)
            | Self::DuplicateDocumentType(_)
            | Self::UnknownField { .. }
            | Self::BulkIndex { .. }
            | Self::InvalidOption(_) => false,
        }
    }

    /// Failed documents of a bulk error, empty for every other error.
    pub fn failures(&self) -> &[BulkItemFailure] {
        match self {
            Self::BulkIndex { failures, .. } => failures,
            _ => &[],
        }
    }
}
