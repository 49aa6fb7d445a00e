//! Domain events to indexing jobs.
//!
//! The relational layer reports mutations as `DomainEvent`s; the dispatcher
//! turns each one into an indexing job on the queue.

use std::sync::Arc;

use serde_json::Value;
use support_search_shared::EntityId;
use tracing::{debug, instrument};

use crate::errors::IndexingError;
use crate::indexer::Indexer;
use crate::jobs::{job, JobId, JobQueue, RetryPolicy};

/// A relational mutation relevant to the search index.
#[derive(Debug, Clone, PartialEq)]
pub enum DomainEvent {
    /// A row was created or updated.
    Saved { doc_type: String, id: EntityId },
    /// A row was deleted. `id` is the document id.
    Deleted { doc_type: String, id: String },
    /// One side of a many-to-many relation was severed.
    RelationRemoved {
        doc_type: String,
        field: String,
        value: Value,
    },
}

impl DomainEvent {
    pub fn doc_type(&self) -> &str {
        match self {
            Self::Saved { doc_type, .. }
            | Self::Deleted { doc_type, .. }
            | Self::RelationRemoved { doc_type, .. } => doc_type,
        }
    }
}

/// Enqueues the indexing job matching each event.
pub struct IndexingDispatcher {
    indexer: Arc<Indexer>,
    queue: Arc<dyn JobQueue>,
    policy: RetryPolicy,
}

impl IndexingDispatcher {
    pub fn new(indexer: Arc<Indexer>, queue: Arc<dyn JobQueue>, policy: RetryPolicy) -> Self {
        Self {
            indexer,
            queue,
            policy,
        }
    }

    /// Enqueue the job for `event`.
    ///
    /// Unknown document types are rejected here rather than in the job.
    #[instrument(skip(self), fields(doc_type = %event.doc_type()))]
    pub async fn dispatch(&self, event: DomainEvent) -> Result<JobId, IndexingError> {
        self.indexer.registry().get(event.doc_type())?;

        let indexer = Arc::clone(&self.indexer);
        let work = match event {
            DomainEvent::Saved { doc_type, id } => job(move || {
                let indexer = Arc::clone(&indexer);
                let doc_type = doc_type.clone();
                async move { indexer.index_object(&doc_type, id).await }
            }),
            DomainEvent::Deleted { doc_type, id } => job(move || {
                let indexer = Arc::clone(&indexer);
                let (doc_type, id) = (doc_type.clone(), id.clone());
                async move { indexer.delete_object(&doc_type, &id).await }
            }),
            DomainEvent::RelationRemoved {
                doc_type,
                field,
                value,
            } => job(move || {
                let indexer = Arc::clone(&indexer);
                let (doc_type, field, value) = (doc_type.clone(), field.clone(), value.clone());
                async move {
                    indexer
                        .remove_from_field(&doc_type, &field, value)
                        .await
                        .map(|_| ())
                }
            }),
        };

        let id = self.queue.submit(work, self.policy).await;
        debug!(job_id = %id, "Enqueued indexing job");
        Ok(id)
    }
}
