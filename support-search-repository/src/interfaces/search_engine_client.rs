//! Search engine client trait definition.
//!
//! This module defines the abstract interface for search engine operations,
//! allowing for different backend implementations (OpenSearch, in-memory, etc.).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::errors::SearchError;

/// Kind of a bulk action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkActionKind {
    Index,
    Update,
    Delete,
}

impl BulkActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Index => "index",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "index" | "create" => Some(Self::Index),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for BulkActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One action of a bulk request.
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    /// Insert or fully replace a document.
    Index { id: String, source: Value },
    /// Partially update a document, creating it when `doc_as_upsert` is set.
    Update {
        id: String,
        doc: Value,
        doc_as_upsert: bool,
    },
    /// Remove a document.
    Delete { id: String },
}

impl BulkAction {
    pub fn id(&self) -> &str {
        match self {
            Self::Index { id, .. } | Self::Update { id, .. } | Self::Delete { id } => id,
        }
    }

    pub fn kind(&self) -> BulkActionKind {
        match self {
            Self::Index { .. } => BulkActionKind::Index,
            Self::Update { .. } => BulkActionKind::Update,
            Self::Delete { .. } => BulkActionKind::Delete,
        }
    }

    /// Render the newline-delimited lines of this action.
    pub fn to_lines(&self, index: &str) -> Vec<Value> {
        let mut header = Map::new();
        header.insert(
            self.kind().as_str().to_string(),
            json!({ "_index": index, "_id": self.id() }),
        );
        let header = Value::Object(header);
        match self {
            Self::Index { source, .. } => vec![header, source.clone()],
            Self::Update {
                doc, doc_as_upsert, ..
            } => vec![header, json!({ "doc": doc, "doc_as_upsert": doc_as_upsert })],
            Self::Delete { .. } => vec![header],
        }
    }
}

/// Per-request options of a bulk call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkOptions {
    /// Client-side timeout of the HTTP request.
    pub timeout: Duration,
    /// Ask the engine to make the writes visible before returning.
    pub refresh: bool,
}

impl Default for BulkOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            refresh: false,
        }
    }
}

/// Outcome of one action within a bulk response.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkItemResult {
    pub action: BulkActionKind,
    pub id: String,
    pub status: u16,
    pub error: Option<Value>,
}

impl BulkItemResult {
    /// True when the engine did not apply the action.
    pub fn is_failure(&self) -> bool {
        self.error.is_some() || !(200..300).contains(&self.status)
    }
}

/// Parsed bulk response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BulkResponse {
    pub took_ms: u64,
    pub items: Vec<BulkItemResult>,
}

impl BulkResponse {
    /// Parse the engine's bulk response body.
    pub fn from_json(body: &Value) -> Result<Self, SearchError> {
        let items = body
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| SearchError::parse("Bulk response has no items"))?;

        let mut parsed = Vec::with_capacity(items.len());
        for item in items {
            let (name, detail) = item
                .as_object()
                .and_then(|obj| obj.iter().next())
                .ok_or_else(|| SearchError::parse("Empty bulk response item"))?;
            let action = BulkActionKind::parse(name)
                .ok_or_else(|| SearchError::parse(format!("Unknown bulk action: {}", name)))?;
            let id = detail
                .get("_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let status = detail
                .get("status")
                .and_then(Value::as_u64)
                .and_then(|s| u16::try_from(s).ok())
                .ok_or_else(|| SearchError::parse("Bulk response item has no status"))?;
            parsed.push(BulkItemResult {
                action,
                id,
                status,
                error: detail.get("error").cloned(),
            });
        }

        Ok(Self {
            took_ms: body.get("took").and_then(Value::as_u64).unwrap_or(0),
            items: parsed,
        })
    }

    /// Items the engine did not apply.
    pub fn failures(&self) -> impl Iterator<Item = &BulkItemResult> {
        self.items.iter().filter(|item| item.is_failure())
    }
}

/// How update-by-query reacts to version conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    Abort,
    Proceed,
}

/// Summary of an update-by-query call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateByQueryResponse {
    pub total: u64,
    pub updated: u64,
    pub version_conflicts: u64,
}

impl UpdateByQueryResponse {
    pub fn from_json(body: &Value) -> Self {
        let count = |key: &str| body.get(key).and_then(Value::as_u64).unwrap_or(0);
        Self {
            total: count("total"),
            updated: count("updated"),
            version_conflicts: count("version_conflicts"),
        }
    }
}

/// Abstract interface for search engine operations.
///
/// Implementations must be stateless from the caller's point of view and
/// safe to share across concurrent tasks; a single handle is injected into
/// every pipeline and search call.
///
/// All methods return `Result<T, SearchError>`. Transport failures surface as
/// `SearchError::Timeout` or `SearchError::ConnectionError` so callers can
/// decide whether to retry.
#[async_trait]
pub trait SearchEngineClient: Send + Sync {
    /// Execute a query DSL body against one or more indices and return the
    /// raw response.
    async fn search(&self, indices: &[String], body: &Value) -> Result<Value, SearchError>;

    /// Insert or fully replace a single document.
    async fn index_document(&self, index: &str, id: &str, source: &Value)
        -> Result<(), SearchError>;

    /// Partially update a single document, creating it if `upsert` is set.
    async fn update_document(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
        upsert: bool,
    ) -> Result<(), SearchError>;

    /// Delete a single document.
    ///
    /// Returns `Ok(false)` if the document did not exist.
    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, SearchError>;

    /// Send a batch of actions in one request.
    ///
    /// Per-document failures are reported in the response, not as an error.
    async fn bulk(
        &self,
        index: &str,
        actions: &[BulkAction],
        options: &BulkOptions,
    ) -> Result<BulkResponse, SearchError>;

    /// Run a scripted update over every document matching the body's query.
    async fn update_by_query(
        &self,
        index: &str,
        body: &Value,
        conflicts: ConflictPolicy,
    ) -> Result<UpdateByQueryResponse, SearchError>;

    /// Create an index with the given settings and mappings.
    async fn create_index(&self, index: &str, body: &Value) -> Result<(), SearchError>;

    /// Check whether an index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Delete an index. Returns `Ok(false)` if it did not exist.
    async fn delete_index(&self, index: &str) -> Result<bool, SearchError>;

    /// Make all writes to the given indices visible to search.
    async fn refresh(&self, indices: &[String]) -> Result<(), SearchError>;

    /// Check if the search engine is healthy and reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}
