//! Batch reindexing.
//!
//! A reindex run selects document types, lists the ids to index for each,
//! slices them into relational-sized chunks and enqueues one bulk job per
//! chunk.

use std::sync::Arc;
use std::time::Duration;

use support_search_shared::EntityId;
use tracing::{info, instrument};

use crate::errors::IndexingError;
use crate::indexer::Indexer;
use crate::jobs::{job, JobId, JobQueue, RetryPolicy};
use crate::registry::DocumentRegistry;
use crate::source::UpdatedWindow;

/// How much of each type's backlog to index.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ReindexAmount {
    #[default]
    All,
    /// The first `n` ids.
    Count(usize),
    /// This percentage of the ids, rounded down.
    Percentage(f64),
}

impl ReindexAmount {
    fn validate(&self) -> Result<(), IndexingError> {
        match *self {
            Self::Percentage(p) if !(p > 0.0 && p <= 100.0) => Err(IndexingError::invalid_option(
                format!("percentage must be in (0, 100], got {}", p),
            )),
            _ => Ok(()),
        }
    }

    fn apply(&self, mut ids: Vec<EntityId>) -> Vec<EntityId> {
        let keep = match *self {
            Self::All => ids.len(),
            Self::Count(n) => n.min(ids.len()),
            Self::Percentage(p) => ((ids.len() as f64) * p / 100.0).floor() as usize,
        };
        ids.truncate(keep);
        ids
    }
}

/// Options of a reindex run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReindexOptions {
    /// Type names to reindex. Empty means every registered type.
    pub types: Vec<String>,
    pub amount: ReindexAmount,
    /// Ids per bulk job.
    pub sql_chunk_size: usize,
    /// Documents per bulk request within a job.
    pub elastic_chunk_size: usize,
    pub timeout: Duration,
    pub window: UpdatedWindow,
    /// Only report how many rows would be indexed.
    pub print_sql_count: bool,
}

impl Default for ReindexOptions {
    fn default() -> Self {
        Self {
            types: Vec::new(),
            amount: ReindexAmount::All,
            sql_chunk_size: 5000,
            elastic_chunk_size: 500,
            timeout: Duration::from_secs(5),
            window: UpdatedWindow::default(),
            print_sql_count: false,
        }
    }
}

/// Ids selected for one document type.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedType {
    pub doc_type: String,
    /// Rows inside the window before the amount was applied.
    pub available: usize,
    pub ids: Vec<EntityId>,
}

/// The work of a reindex run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReindexPlan {
    pub types: Vec<PlannedType>,
    options: ReindexOptions,
}

impl ReindexPlan {
    /// List the ids to index for every selected type.
    #[instrument(skip(registry, options))]
    pub async fn build(
        registry: &DocumentRegistry,
        options: ReindexOptions,
    ) -> Result<Self, IndexingError> {
        options.amount.validate()?;
        if options.sql_chunk_size == 0 || options.elastic_chunk_size == 0 {
            return Err(IndexingError::invalid_option("chunk sizes must be positive"));
        }

        let selected = if options.types.is_empty() {
            registry.all_types().to_vec()
        } else {
            options
                .types
                .iter()
                .map(|name| registry.get(name))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut types = Vec::with_capacity(selected.len());
        for doc_type in selected {
            let ids = doc_type.ids(&options.window).await?;
            let available = ids.len();
            let ids = options.amount.apply(ids);
            info!(
                doc_type = doc_type.name(),
                available = available,
                selected = ids.len(),
                "Planned reindex"
            );
            types.push(PlannedType {
                doc_type: doc_type.name().to_string(),
                available,
                ids,
            });
        }

        Ok(Self { types, options })
    }

    /// Rows to index per type.
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.types
            .iter()
            .map(|planned| (planned.doc_type.as_str(), planned.ids.len()))
            .collect()
    }

    /// Number of bulk jobs `enqueue` submits.
    pub fn job_count(&self) -> usize {
        self.types
            .iter()
            .map(|planned| planned.ids.len().div_ceil(self.options.sql_chunk_size))
            .sum()
    }

    /// Submit one bulk job per chunk of ids. Nothing is submitted when only
    /// counts were requested.
    pub async fn enqueue(
        &self,
        indexer: Arc<Indexer>,
        queue: &dyn JobQueue,
        policy: RetryPolicy,
    ) -> Vec<JobId> {
        if self.options.print_sql_count {
            return Vec::new();
        }

        let mut submitted = Vec::with_capacity(self.job_count());
        for planned in &self.types {
            for chunk in planned.ids.chunks(self.options.sql_chunk_size) {
                let indexer = Arc::clone(&indexer);
                let doc_type = planned.doc_type.clone();
                let ids = chunk.to_vec();
                let timeout = self.options.timeout;
                let chunk_size = self.options.elastic_chunk_size;

                let work = job(move || {
                    let indexer = Arc::clone(&indexer);
                    let doc_type = doc_type.clone();
                    let ids = ids.clone();
                    async move {
                        indexer
                            .index_objects_bulk(&doc_type, &ids, Some(timeout), Some(chunk_size))
                            .await
                            .map(|_| ())
                    }
                });
                submitted.push(queue.submit(work, policy).await);
            }
            info!(doc_type = %planned.doc_type, count = planned.ids.len(), "Enqueued reindex jobs");
        }
        submitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amounts() {
        let ids: Vec<EntityId> = (1..=10).collect();
        assert_eq!(ReindexAmount::All.apply(ids.clone()).len(), 10);
        assert_eq!(ReindexAmount::Count(3).apply(ids.clone()), vec![1, 2, 3]);
        assert_eq!(ReindexAmount::Count(30).apply(ids.clone()).len(), 10);
        assert_eq!(ReindexAmount::Percentage(25.0).apply(ids).len(), 2);
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(ReindexAmount::Percentage(0.0).validate().is_err());
        assert!(ReindexAmount::Percentage(100.5).validate().is_err());
        assert!(ReindexAmount::Percentage(f64::NAN).validate().is_err());
        assert!(ReindexAmount::Percentage(100.0).validate().is_ok());
    }
}
