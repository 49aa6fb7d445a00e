//! Index lifecycle for the registered document types.

use std::sync::Arc;

use support_search_repository::opensearch::get_index_settings;
use support_search_repository::{AnalyzerBuilder, EngineConfig, IndexNaming, SearchEngineClient};
use support_search_shared::Locale;
use tracing::{info, instrument};

use crate::errors::IndexingError;
use crate::registry::DocumentRegistry;

/// Creates and drops the index of every registered type.
pub struct IndexManager {
    client: Arc<dyn SearchEngineClient>,
    registry: Arc<DocumentRegistry>,
    naming: IndexNaming,
    engine: EngineConfig,
    analyzers: AnalyzerBuilder,
    locales: Vec<Locale>,
}

impl IndexManager {
    pub fn new(
        client: Arc<dyn SearchEngineClient>,
        registry: Arc<DocumentRegistry>,
        naming: IndexNaming,
        engine: EngineConfig,
        analyzers: AnalyzerBuilder,
        locales: Vec<Locale>,
    ) -> Self {
        Self {
            client,
            registry,
            naming,
            engine,
            analyzers,
            locales,
        }
    }

    /// Create every missing index. Returns the names of the created ones.
    #[instrument(skip(self))]
    pub async fn init_indices(&self) -> Result<Vec<String>, IndexingError> {
        let mut created = Vec::new();

        for doc_type in self.registry.all_types() {
            let index = self.naming.index(doc_type.index());
            if self.client.index_exists(&index).await? {
                info!(index = %index, "Index already exists");
                continue;
            }

            let mapping = doc_type.mapping(&self.analyzers, &self.locales);
            let body = get_index_settings(&self.engine, &self.analyzers, &self.locales, &mapping);
            self.client.create_index(&index, &body).await?;
            info!(index = %index, doc_type = doc_type.name(), "Created index");
            created.push(index);
        }

        Ok(created)
    }

    /// Drop every index. Returns the names of the ones that existed.
    #[instrument(skip(self))]
    pub async fn delete_indices(&self) -> Result<Vec<String>, IndexingError> {
        let mut deleted = Vec::new();

        for doc_type in self.registry.all_types() {
            let index = self.naming.index(doc_type.index());
            if self.client.delete_index(&index).await? {
                info!(index = %index, "Deleted index");
                deleted.push(index);
            }
        }

        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EntityStores;
    use crate::source::MemoryStore;
    use support_search_repository::InMemoryEngine;
    use support_search_shared::{ForumPost, Profile, Question, WikiArticle};

    fn manager(engine: Arc<InMemoryEngine>) -> IndexManager {
        let registry = DocumentRegistry::standard(EntityStores {
            wiki: Arc::new(MemoryStore::<WikiArticle>::new(vec![])),
            question: Arc::new(MemoryStore::<Question>::new(vec![])),
            profile: Arc::new(MemoryStore::<Profile>::new(vec![])),
            forum: Arc::new(MemoryStore::<ForumPost>::new(vec![])),
        })
        .unwrap();
        IndexManager::new(
            engine,
            Arc::new(registry),
            IndexNaming::new("stage"),
            EngineConfig::default(),
            AnalyzerBuilder::default(),
            vec![Locale::new("en-US").unwrap(), Locale::new("fr").unwrap()],
        )
    }

    #[tokio::test]
    async fn test_init_indices_is_idempotent() {
        let engine = Arc::new(InMemoryEngine::new());
        let manager = manager(engine.clone());

        let created = manager.init_indices().await.unwrap();
        assert_eq!(
            created,
            vec!["stage_wiki_document", "stage_question", "stage_user", "stage_forum"]
        );
        assert!(manager.init_indices().await.unwrap().is_empty());

        let body = engine.index_body("stage_wiki_document").await.unwrap();
        assert_eq!(
            body["mappings"]["properties"]["title"]["properties"]["fr"]["search_analyzer"],
            "sumo_search_fr"
        );
        assert!(body["settings"]["analysis"]["analyzer"]["sumo_search_fr"].is_object());
    }

    #[tokio::test]
    async fn test_delete_indices() {
        let engine = Arc::new(InMemoryEngine::new());
        let manager = manager(engine.clone());
        manager.init_indices().await.unwrap();

        assert_eq!(manager.delete_indices().await.unwrap().len(), 4);
        assert!(manager.delete_indices().await.unwrap().is_empty());
    }
}
