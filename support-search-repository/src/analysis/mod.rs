//! Locale-aware text analysis configuration.

pub mod builder;
pub mod locales;
pub mod synonyms;

pub use builder::{
    filter_name, AnalysisConfig, AnalyzerBuilder, AnalyzerSpec, NamedFilter, DEFAULT_ANALYZER,
};
pub use locales::{FilterSpec, LocaleAnalyzerConfig};
pub use synonyms::SynonymCatalog;
