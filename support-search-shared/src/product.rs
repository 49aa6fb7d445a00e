//! Product scope used to filter searches.

use serde::{Deserialize, Serialize};

use crate::models::EntityId;

/// A product (e.g. "Firefox") that articles and questions are filed under.
///
/// Products live in the relational store; the search system only needs the
/// primary key for filtering and the title for the result page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub slug: String,
    pub title: String,
}

impl Product {
    pub fn new(id: EntityId, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id,
            slug: slug.into(),
            title: title.into(),
        }
    }
}
