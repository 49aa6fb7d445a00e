//! OpenSearch index settings and mappings.
//!
//! This module assembles the body sent when a document type's index is
//! created: shard layout, the locale analysis block and the type's mapping.

use serde_json::{json, Value};
use support_search_shared::Locale;

use crate::analysis::AnalyzerBuilder;
use crate::config::EngineConfig;
use crate::mappings::Mapping;

/// Get the index creation body for one document type.
///
/// The analysis block declares every index and query analyzer for `locales`,
/// so every locale sub-field of the mapping resolves to a defined analyzer.
pub fn get_index_settings(
    engine: &EngineConfig,
    analyzers: &AnalyzerBuilder,
    locales: &[Locale],
    mapping: &Mapping,
) -> Value {
    json!({
        "settings": {
            "number_of_shards": engine.number_of_shards,
            "number_of_replicas": engine.number_of_replicas,
            "analysis": analyzers.analysis_settings(locales),
        },
        "mappings": mapping.to_json(),
    })
}
