//! # Support Search Repository
//!
//! This crate provides traits and implementations for interacting with the
//! search engine. It includes definitions for errors, the engine client
//! interface, locale-aware analysis configuration, index mappings, a
//! concrete implementation for OpenSearch and an in-memory engine for tests.

pub mod analysis;
pub mod config;
pub mod errors;
pub mod interfaces;
pub mod mappings;
pub mod memory;
pub mod opensearch;

pub use analysis::{AnalysisConfig, AnalyzerBuilder, AnalyzerSpec, SynonymCatalog};
pub use config::{EngineConfig, IndexNaming};
pub use mappings::Mapping;
pub use errors::SearchError;
pub use interfaces::{
    BulkAction, BulkActionKind, BulkItemResult, BulkOptions, BulkResponse, ConflictPolicy,
    SearchEngineClient, UpdateByQueryResponse,
};
pub use memory::InMemoryEngine;
pub use opensearch::OpenSearchClient;
