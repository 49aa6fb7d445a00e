//! Entity exports backing the CLI's entity stores.
//!
//! The relational database is owned by the site; the CLI reads JSON exports of
//! its tables instead. Each file holds a JSON array of rows, and a missing
//! file is an empty table.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use support_search_pipeline::{EntityStores, IndexingError, MemoryStore};
use support_search_shared::{Entity, ForumPost, Product, Profile, Question, WikiArticle};
use tracing::{debug, info};

use crate::AppError;

pub const WIKI_FILE: &str = "wiki.json";
pub const QUESTIONS_FILE: &str = "questions.json";
pub const PROFILES_FILE: &str = "profiles.json";
pub const FORUM_FILE: &str = "forum.json";
pub const PRODUCTS_FILE: &str = "products.json";

/// Entity stores and the product catalog.
pub struct Fixtures {
    pub stores: EntityStores,
    pub products: Vec<Product>,
}

impl Fixtures {
    /// Empty tables everywhere.
    pub fn empty() -> Self {
        Self {
            stores: EntityStores {
                wiki: Arc::new(MemoryStore::<WikiArticle>::new(Vec::new())),
                question: Arc::new(MemoryStore::<Question>::new(Vec::new())),
                profile: Arc::new(MemoryStore::<Profile>::new(Vec::new())),
                forum: Arc::new(MemoryStore::<ForumPost>::new(Vec::new())),
            },
            products: Vec::new(),
        }
    }

    /// Load the exports found in `dir`, or empty tables when no directory is set.
    pub fn load(dir: Option<&Path>) -> Result<Self, AppError> {
        let Some(dir) = dir else {
            info!("No fixtures directory configured, entity stores are empty");
            return Ok(Self::empty());
        };

        let products = if dir.join(PRODUCTS_FILE).exists() {
            let text = std::fs::read_to_string(dir.join(PRODUCTS_FILE))?;
            serde_json::from_str(&text).map_err(|e| {
                AppError::setup(format!("{}: {}", dir.join(PRODUCTS_FILE).display(), e))
            })?
        } else {
            Vec::new()
        };

        Ok(Self {
            stores: EntityStores {
                wiki: Arc::new(store::<WikiArticle>(dir, WIKI_FILE)?),
                question: Arc::new(store::<Question>(dir, QUESTIONS_FILE)?),
                profile: Arc::new(store::<Profile>(dir, PROFILES_FILE)?),
                forum: Arc::new(store::<ForumPost>(dir, FORUM_FILE)?),
            },
            products,
        })
    }
}

fn store<E>(dir: &Path, file: &str) -> Result<MemoryStore<E>, IndexingError>
where
    E: Entity + Clone + DeserializeOwned,
{
    let path = dir.join(file);
    if !path.exists() {
        debug!(path = %path.display(), "No export, using an empty table");
        return Ok(MemoryStore::new(Vec::new()));
    }
    MemoryStore::from_json_file(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use support_search_pipeline::EntityStore;

    #[tokio::test]
    async fn test_load_exports() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(PROFILES_FILE),
            r#"[{"user_id": 4, "username": "ada", "updated": "2024-01-01T00:00:00Z"}]"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(PRODUCTS_FILE),
            r#"[{"id": 1, "slug": "firefox", "title": "Firefox"}]"#,
        )
        .unwrap();

        let fixtures = Fixtures::load(Some(dir.path())).unwrap();
        assert_eq!(fixtures.products.len(), 1);
        let profiles = fixtures.stores.profile.get_queryset(&[4]).await.unwrap();
        assert_eq!(profiles[0].username, "ada");
        assert!(fixtures.stores.wiki.get_queryset(&[1]).await.unwrap().is_empty());
    }

    #[test]
    fn test_broken_export_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(WIKI_FILE), "{ not json").unwrap();
        assert!(matches!(
            Fixtures::load(Some(dir.path())),
            Err(AppError::Indexing(_))
        ));
    }
}
