//! Indexing Pipeline.
//!
//! Keeps the engine's documents in line with relational state. Every
//! operation re-derives documents from the rows as they are when it runs,
//! so jobs may execute late, twice or out of order and still converge.

mod retry;

pub use retry::with_retry;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::{json, Value};
use support_search_repository::{
    BulkAction, BulkActionKind, BulkOptions, ConflictPolicy, IndexNaming, SearchEngineClient,
    UpdateByQueryResponse,
};
use support_search_shared::EntityId;
use tracing::{debug, error, info, instrument, warn};

use crate::documents::{PreparedAction, INDEXED_ON_FIELD};
use crate::errors::{BulkItemFailure, IndexingError};
use crate::registry::{DocumentRegistry, DocumentType};

/// Painless script removing `params.value` from the array `params.field`.
const REMOVE_FROM_FIELD_SCRIPT: &str = "if (ctx._source[params.field] != null) { \
     int i = ctx._source[params.field].indexOf(params.value); \
     if (i >= 0) { ctx._source[params.field].remove(i); } }";

/// Configuration for the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexerConfig {
    /// Request timeout, also used as the delay between retries.
    pub timeout: Duration,
    /// Documents per bulk request.
    pub chunk_size: usize,
    /// Retries of a request after a timeout or connection failure.
    pub max_retries: u32,
    /// Make every write visible before returning. Meant for tests and
    /// verification runs.
    pub refresh: bool,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            chunk_size: 500,
            max_retries: 3,
            refresh: false,
        }
    }
}

/// Outcome of a successful bulk indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSummary {
    /// Ids asked for.
    pub requested: usize,
    /// Documents indexed or upserted.
    pub indexed: usize,
    /// Documents deleted.
    pub deleted: usize,
    /// Deletes of documents that were already gone.
    pub ignored: usize,
    /// Bulk requests sent, retries excluded.
    pub chunks: usize,
}

/// The indexing pipeline.
pub struct Indexer {
    client: Arc<dyn SearchEngineClient>,
    registry: Arc<DocumentRegistry>,
    naming: IndexNaming,
    config: IndexerConfig,
}

impl Indexer {
    pub fn new(
        client: Arc<dyn SearchEngineClient>,
        registry: Arc<DocumentRegistry>,
        naming: IndexNaming,
        config: IndexerConfig,
    ) -> Self {
        Self {
            client,
            registry,
            naming,
            config,
        }
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Physical index name of a document type.
    pub fn index_name(&self, doc_type: &dyn DocumentType) -> String {
        self.naming.index(doc_type.index())
    }

    /// Index a single row.
    ///
    /// A row that no longer exists is not an error: its deletion job simply
    /// has not run yet.
    #[instrument(skip(self), fields(doc_type = %type_name))]
    pub async fn index_object(&self, type_name: &str, id: EntityId) -> Result<(), IndexingError> {
        let doc_type = self.registry.get(type_name)?;
        let index = self.index_name(doc_type.as_ref());

        let Some(action) = doc_type.prepare_queryset(&[id]).await?.into_iter().next() else {
            debug!(id = id, "Row no longer exists, nothing to index");
            return Ok(());
        };

        let client = self.client.as_ref();
        let (max_retries, timeout) = (self.config.max_retries, self.config.timeout);
        match action {
            PreparedAction::Document(doc) => {
                let source = stamp(doc.to_source(), &now());
                let upsert = doc_type.update_document();
                let (index, id, source) = (index.as_str(), doc.id.as_str(), &source);
                with_retry("index", max_retries, timeout, move || async move {
                    if upsert {
                        client.update_document(index, id, source, true).await
                    } else {
                        client.index_document(index, id, source).await
                    }
                })
                .await?;
                debug!(index = %index, id = %id, "Indexed document");
            }
            PreparedAction::Remove { id } => {
                let (index, id) = (index.as_str(), id.as_str());
                with_retry("delete", max_retries, timeout, move || {
                    client.delete_document(index, id)
                })
                .await?;
                debug!(index = %index, id = %id, "Removed ineligible document");
            }
        }

        self.refresh_if_configured(&index).await
    }

    /// Index many rows through chunked bulk requests.
    ///
    /// Rows are loaded in one query. `timeout` and `chunk_size` default to
    /// the configured values. Deletes of missing documents are tolerated;
    /// any other refused document is collected and, once every chunk has
    /// been sent, reported in a single `BulkIndex` error.
    #[instrument(skip(self, ids), fields(doc_type = %type_name, count = ids.len()))]
    pub async fn index_objects_bulk(
        &self,
        type_name: &str,
        ids: &[EntityId],
        timeout: Option<Duration>,
        chunk_size: Option<usize>,
    ) -> Result<BulkSummary, IndexingError> {
        let doc_type = self.registry.get(type_name)?;
        let chunk_size = chunk_size.unwrap_or(self.config.chunk_size);
        if chunk_size == 0 {
            return Err(IndexingError::invalid_option("chunk size must be positive"));
        }
        let timeout = timeout.unwrap_or(self.config.timeout);
        let index = self.index_name(doc_type.as_ref());

        let prepared = doc_type.prepare_queryset(ids).await?;
        let indexed_on = now();
        let actions: Vec<BulkAction> = prepared
            .into_iter()
            .map(|action| to_bulk_action(action, doc_type.update_document(), &indexed_on))
            .collect();

        let options = BulkOptions {
            timeout,
            refresh: self.config.refresh,
        };
        let mut summary = BulkSummary {
            requested: ids.len(),
            ..BulkSummary::default()
        };
        let mut failures: Vec<BulkItemFailure> = Vec::new();

        let client = self.client.as_ref();
        let (index_name, options) = (index.as_str(), &options);
        for chunk in actions.chunks(chunk_size) {
            let response = with_retry("bulk", self.config.max_retries, timeout, move || {
                client.bulk(index_name, chunk, options)
            })
            .await?;
            summary.chunks += 1;

            for item in response.items {
                let is_delete = item.action == BulkActionKind::Delete;
                if !item.is_failure() {
                    if is_delete {
                        summary.deleted += 1;
                    } else {
                        summary.indexed += 1;
                    }
                } else if is_delete && matches!(item.status, 400 | 404) {
                    debug!(id = %item.id, status = item.status, "Ignoring delete of missing document");
                    summary.ignored += 1;
                } else {
                    warn!(id = %item.id, status = item.status, "Document refused by engine");
                    failures.push(item.into());
                }
            }
        }

        if !failures.is_empty() {
            error!(
                index = %index,
                failed = failures.len(),
                indexed = summary.indexed,
                "Bulk indexing finished with failures"
            );
            return Err(IndexingError::BulkIndex {
                doc_type: type_name.to_string(),
                failures,
            });
        }

        info!(
            index = %index,
            indexed = summary.indexed,
            deleted = summary.deleted,
            ignored = summary.ignored,
            chunks = summary.chunks,
            "Bulk indexing complete"
        );
        Ok(summary)
    }

    /// Remove a single document. Deleting an absent document succeeds.
    #[instrument(skip(self), fields(doc_type = %type_name))]
    pub async fn delete_object(&self, type_name: &str, id: &str) -> Result<(), IndexingError> {
        let doc_type = self.registry.get(type_name)?;
        let index = self.index_name(doc_type.as_ref());

        let client = self.client.as_ref();
        let index_name = index.as_str();
        let existed = with_retry("delete", self.config.max_retries, self.config.timeout, move || {
            client.delete_document(index_name, id)
        })
        .await?;
        if !existed {
            debug!(index = %index, id = id, "Document was already absent");
        }

        self.refresh_if_configured(&index).await
    }

    /// Remove `value` from the array field `field` of every document that
    /// contains it. Version conflicts with concurrent writers are skipped.
    #[instrument(skip(self), fields(doc_type = %type_name))]
    pub async fn remove_from_field(
        &self,
        type_name: &str,
        field: &str,
        value: Value,
    ) -> Result<UpdateByQueryResponse, IndexingError> {
        let doc_type = self.registry.get(type_name)?;
        if !doc_type.field_names().iter().any(|name| name == field) {
            return Err(IndexingError::UnknownField {
                doc_type: type_name.to_string(),
                field: field.to_string(),
            });
        }
        let index = self.index_name(doc_type.as_ref());
        let body = remove_from_field_body(field, &value);

        let client = self.client.as_ref();
        let (index_name, body) = (index.as_str(), &body);
        let response = with_retry(
            "update_by_query",
            self.config.max_retries,
            self.config.timeout,
            move || client.update_by_query(index_name, body, ConflictPolicy::Proceed),
        )
        .await?;

        info!(
            index = %index,
            field = field,
            updated = response.updated,
            version_conflicts = response.version_conflicts,
            "Removed value from field"
        );
        self.refresh_if_configured(&index).await?;
        Ok(response)
    }

    async fn refresh_if_configured(&self, index: &str) -> Result<(), IndexingError> {
        if self.config.refresh {
            self.client.refresh(&[index.to_string()]).await?;
        }
        Ok(())
    }
}

/// Update-by-query body scrubbing `value` from `field`.
pub fn remove_from_field_body(field: &str, value: &Value) -> Value {
    json!({
        "query": { "term": { field: value } },
        "script": {
            "source": REMOVE_FROM_FIELD_SCRIPT,
            "lang": "painless",
            "params": { "field": field, "value": value },
        },
    })
}

fn to_bulk_action(action: PreparedAction, update_document: bool, indexed_on: &str) -> BulkAction {
    match action {
        PreparedAction::Document(doc) => {
            let source = stamp(doc.to_source(), indexed_on);
            if update_document {
                BulkAction::Update {
                    id: doc.id,
                    doc: source,
                    doc_as_upsert: true,
                }
            } else {
                BulkAction::Index {
                    id: doc.id,
                    source,
                }
            }
        }
        PreparedAction::Remove { id } => BulkAction::Delete { id },
    }
}

fn stamp(mut source: Value, indexed_on: &str) -> Value {
    if let Some(fields) = source.as_object_mut() {
        fields.insert(INDEXED_ON_FIELD.to_string(), Value::from(indexed_on));
    }
    source
}

fn now() -> String {
    crate::documents::timestamp(Utc::now())
}
