//! Relational entity access.
//!
//! The relational store is an external collaborator. The pipeline only needs
//! to batch-load rows by primary key and to list the keys updated inside a
//! window; `EntityStore` captures exactly that.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use support_search_shared::{Entity, EntityId};
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::IndexingError;

/// Incremental reindex window on the entities' last update time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdatedWindow {
    /// Only rows updated strictly before this instant.
    pub before: Option<DateTime<Utc>>,
    /// Only rows updated strictly after this instant.
    pub after: Option<DateTime<Utc>>,
}

impl UpdatedWindow {
    pub fn contains(&self, updated: DateTime<Utc>) -> bool {
        self.before.map_or(true, |before| updated < before)
            && self.after.map_or(true, |after| updated > after)
    }
}

/// Read-only accessor of one entity kind.
#[async_trait]
pub trait EntityStore<E>: Send + Sync {
    /// Load the rows with the given ids. Missing ids are skipped.
    async fn get_queryset(&self, ids: &[EntityId]) -> Result<Vec<E>, IndexingError>;

    /// Ids of every row updated inside `window`, ascending.
    async fn ids(&self, window: &UpdatedWindow) -> Result<Vec<EntityId>, IndexingError>;
}

/// Entity store backed by memory, loadable from a JSON export.
pub struct MemoryStore<E> {
    rows: RwLock<BTreeMap<EntityId, E>>,
}

impl<E: Entity + Clone> MemoryStore<E> {
    pub fn new(rows: Vec<E>) -> Self {
        Self {
            rows: RwLock::new(rows.into_iter().map(|row| (row.id(), row)).collect()),
        }
    }

    /// Insert or replace a row.
    pub async fn upsert(&self, row: E) {
        self.rows.write().await.insert(row.id(), row);
    }

    pub async fn remove(&self, id: EntityId) -> Option<E> {
        self.rows.write().await.remove(&id)
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl<E: Entity + Clone + DeserializeOwned> MemoryStore<E> {
    /// Load rows from a JSON array file.
    pub fn from_json_file(path: &Path) -> Result<Self, IndexingError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| IndexingError::store(format!("{}: {}", path.display(), e)))?;
        let rows: Vec<E> = serde_json::from_str(&text)
            .map_err(|e| IndexingError::store(format!("{}: {}", path.display(), e)))?;

        info!(path = %path.display(), count = rows.len(), "Loaded entity export");
        Ok(Self::new(rows))
    }
}

#[async_trait]
impl<E: Entity + Clone + 'static> EntityStore<E> for MemoryStore<E> {
    async fn get_queryset(&self, ids: &[EntityId]) -> Result<Vec<E>, IndexingError> {
        let rows = self.rows.read().await;
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn ids(&self, window: &UpdatedWindow) -> Result<Vec<EntityId>, IndexingError> {
        let rows = self.rows.read().await;
        Ok(rows
            .values()
            .filter(|row| window.contains(row.updated()))
            .map(|row| row.id())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use support_search_shared::Profile;

    fn profile(id: EntityId, day: u32) -> Profile {
        Profile {
            user_id: id,
            username: format!("user{}", id),
            name: None,
            is_active: true,
            involved_from: None,
            product_ids: vec![],
            group_ids: vec![],
            updated: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_get_queryset_skips_missing() {
        let store = MemoryStore::new(vec![profile(1, 1), profile(2, 2)]);
        let rows = store.get_queryset(&[2, 3, 1]).await.unwrap();
        let ids: Vec<EntityId> = rows.iter().map(|p| p.user_id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[tokio::test]
    async fn test_ids_in_window() {
        let store = MemoryStore::new(vec![profile(1, 1), profile(2, 5), profile(3, 10)]);
        let window = UpdatedWindow {
            after: Some(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()),
            before: Some(Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap()),
        };
        assert_eq!(store.ids(&window).await.unwrap(), vec![2]);
        assert_eq!(
            store.ids(&UpdatedWindow::default()).await.unwrap(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");
        std::fs::write(
            &path,
            r#"[{"user_id": 7, "username": "ana", "updated": "2024-03-01T00:00:00Z"}]"#,
        )
        .unwrap();

        let store: MemoryStore<Profile> = MemoryStore::from_json_file(&path).unwrap();
        let rows = store.get_queryset(&[7]).await.unwrap();
        assert_eq!(rows[0].username, "ana");
        assert!(rows[0].is_active);
    }
}
