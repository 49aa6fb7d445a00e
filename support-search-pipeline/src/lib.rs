//! # Support Search Pipeline
//!
//! Keeps the search indices consistent with the relational store.
//!
//! The crate holds the Document Type Registry and the document schemas, the
//! relational accessors the schemas read from, the job queue abstraction and
//! the Indexing Pipeline itself: single and bulk indexing, deletion and
//! relation scrubbing. Index creation, domain-event dispatch and batch
//! reindex planning are built on top of it.

pub mod documents;
pub mod errors;
pub mod events;
pub mod indexer;
pub mod jobs;
pub mod registry;
pub mod reindex;
pub mod schema;
pub mod source;

pub use documents::{
    DocumentSchema, ForumDocument, PreparedAction, ProfileDocument, QuestionDocument,
    WikiDocument,
};
pub use errors::{BulkItemFailure, IndexingError};
pub use events::{DomainEvent, IndexingDispatcher};
pub use indexer::{BulkSummary, Indexer, IndexerConfig};
pub use jobs::{job, InlineJobQueue, Job, JobId, JobQueue, RetryPolicy, TokioJobQueue};
pub use registry::{DocumentRegistry, DocumentType, EntityStores, RegisteredType};
pub use reindex::{PlannedType, ReindexAmount, ReindexOptions, ReindexPlan};
pub use schema::IndexManager;
pub use source::{EntityStore, MemoryStore, UpdatedWindow};
