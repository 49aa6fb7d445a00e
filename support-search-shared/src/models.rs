//! Relational entities handed to the search system by the data layer.
//!
//! The search system never writes these back; they are read-only snapshots
//! of the rows at the time an indexing job runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Primary key of a relational row.
pub type EntityId = i64;

/// Common accessors needed to select and batch-load rows.
pub trait Entity: Send + Sync {
    fn id(&self) -> EntityId;

    /// Last modification time, used for incremental reindex windows.
    fn updated(&self) -> DateTime<Utc>;
}

/// A knowledge base article in one locale.
///
/// Translations point at the English original through `parent_id` and are
/// merged into the original's search document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiArticle {
    pub id: EntityId,
    #[serde(default)]
    pub parent_id: Option<EntityId>,
    pub locale: Locale,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    /// Rendered HTML of the current revision.
    #[serde(default)]
    pub content_html: String,
    #[serde(default)]
    pub keywords: String,
    pub category: u32,
    #[serde(default)]
    pub is_archived: bool,
    /// False until a revision has been approved.
    #[serde(default = "default_true")]
    pub has_current_revision: bool,
    #[serde(default)]
    pub product_ids: Vec<EntityId>,
    #[serde(default)]
    pub topic_ids: Vec<EntityId>,
    pub updated: DateTime<Utc>,
    /// Recorded visits, used to rank the popular-articles fallback.
    #[serde(default)]
    pub visits: u64,
    /// On a translation, whether the parent article is archived or still
    /// lacks an approved revision. Always false on a parent.
    #[serde(default)]
    pub parent_is_hidden: bool,
}

impl WikiArticle {
    /// Id of the search document this article contributes to.
    pub fn document_id(&self) -> EntityId {
        self.parent_id.unwrap_or(self.id)
    }
}

impl Entity for WikiArticle {
    fn id(&self) -> EntityId {
        self.id
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

/// An answer to a support question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: EntityId,
    pub content_html: String,
    pub creator_id: EntityId,
    #[serde(default)]
    pub is_spam: bool,
}

/// A support forum question with its answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: EntityId,
    pub locale: Locale,
    pub title: String,
    pub content_html: String,
    pub creator_id: EntityId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub updated_by_id: Option<EntityId>,
    #[serde(default)]
    pub solution_id: Option<EntityId>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub is_spam: bool,
    #[serde(default)]
    pub product_id: Option<EntityId>,
    #[serde(default)]
    pub topic_id: Option<EntityId>,
    #[serde(default)]
    pub tag_ids: Vec<EntityId>,
    #[serde(default)]
    pub num_votes: u32,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

impl Entity for Question {
    fn id(&self) -> EntityId {
        self.id
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

/// A user profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: EntityId,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub involved_from: Option<DateTime<Utc>>,
    #[serde(default)]
    pub product_ids: Vec<EntityId>,
    #[serde(default)]
    pub group_ids: Vec<EntityId>,
    pub updated: DateTime<Utc>,
}

impl Entity for Profile {
    fn id(&self) -> EntityId {
        self.user_id
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

/// A post in a contributor forum thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForumPost {
    pub id: EntityId,
    pub thread_id: EntityId,
    pub thread_title: String,
    pub forum_id: EntityId,
    pub forum_slug: String,
    pub content_html: String,
    pub author_id: EntityId,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    #[serde(default)]
    pub updated_by_id: Option<EntityId>,
    #[serde(default)]
    pub thread_is_locked: bool,
    #[serde(default)]
    pub thread_is_sticky: bool,
}

impl Entity for ForumPost {
    fn id(&self) -> EntityId {
        self.id
    }

    fn updated(&self) -> DateTime<Utc> {
        self.updated
    }
}

fn default_true() -> bool {
    true
}
