//! Document schemas.
//!
//! A schema maps one relational entity kind onto one search index: it names
//! the index, declares the mapping and turns a row into a `SearchDocument`.
//! `prepare` is a pure function of the row, so preparing an unchanged row
//! twice yields identical documents.

mod forum;
mod profile;
mod question;
mod wiki;

pub use forum::ForumDocument;
pub use profile::ProfileDocument;
pub use question::QuestionDocument;
pub use wiki::WikiDocument;

use support_search_repository::{AnalyzerBuilder, Mapping};
use support_search_shared::{Entity, Locale, SearchDocument};

/// Field stamped with the submission time by the pipeline.
pub const INDEXED_ON_FIELD: &str = "indexed_on";

/// What to send to the engine for one row.
#[derive(Debug, Clone, PartialEq)]
pub enum PreparedAction {
    /// Index (or upsert) the document.
    Document(SearchDocument),
    /// Remove the document with this id.
    Remove { id: String },
}

impl PreparedAction {
    pub fn id(&self) -> &str {
        match self {
            Self::Document(doc) => &doc.id,
            Self::Remove { id } => id,
        }
    }
}

/// Schema of one document type.
pub trait DocumentSchema: Send + Sync + 'static {
    type Entity: Entity + Clone + 'static;

    /// Registry name of the type.
    const NAME: &'static str;
    /// Logical index name.
    const INDEX: &'static str;
    /// Upsert partial documents instead of replacing whole documents.
    const UPDATE_DOCUMENT: bool;

    /// Field mappings, with one sub-field per locale for multi-locale fields.
    fn mapping(&self, analyzers: &AnalyzerBuilder, locales: &[Locale]) -> Mapping;

    /// Serialize a row.
    fn prepare(&self, entity: &Self::Entity) -> SearchDocument;

    /// Whether the row belongs in the index at all.
    fn is_eligible(&self, _entity: &Self::Entity) -> bool {
        true
    }

    /// Engine id of the row's document.
    fn document_id(&self, entity: &Self::Entity) -> String {
        entity.id().to_string()
    }

    /// The action that brings the index in line with the row.
    fn prepare_action(&self, entity: &Self::Entity) -> PreparedAction {
        if self.is_eligible(entity) {
            PreparedAction::Document(self.prepare(entity))
        } else {
            PreparedAction::Remove {
                id: self.document_id(entity),
            }
        }
    }
}

/// Convert a timestamp into the engine's date format.
pub(crate) fn timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
