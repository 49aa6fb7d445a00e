//! Document Type Registry.
//!
//! The registry is populated explicitly at process start and is the only
//! place mapping a type name to its index, schema and relational accessor.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use support_search_repository::{AnalyzerBuilder, Mapping};
use support_search_shared::{EntityId, ForumPost, Locale, Profile, Question, WikiArticle};
use tracing::debug;

use crate::documents::{
    DocumentSchema, ForumDocument, PreparedAction, ProfileDocument, QuestionDocument,
    WikiDocument,
};
use crate::errors::IndexingError;
use crate::source::{EntityStore, UpdatedWindow};

/// A registered document type, erased over its entity kind.
#[async_trait]
pub trait DocumentType: Send + Sync {
    fn name(&self) -> &'static str;

    /// Logical index name.
    fn index(&self) -> &'static str;

    fn update_document(&self) -> bool;

    fn mapping(&self, analyzers: &AnalyzerBuilder, locales: &[Locale]) -> Mapping;

    /// Top-level field names of the mapping.
    fn field_names(&self) -> Vec<String> {
        self.mapping(&AnalyzerBuilder::default(), &[])
            .field_names()
            .map(str::to_string)
            .collect()
    }

    /// Batch-load the rows with the given ids and prepare one action each.
    ///
    /// Ids without a row are skipped.
    async fn prepare_queryset(&self, ids: &[EntityId]) -> Result<Vec<PreparedAction>, IndexingError>;

    /// Ids of the rows updated inside `window`.
    async fn ids(&self, window: &UpdatedWindow) -> Result<Vec<EntityId>, IndexingError>;
}

/// A schema bound to the store its rows come from.
pub struct RegisteredType<S: DocumentSchema> {
    schema: S,
    store: Arc<dyn EntityStore<S::Entity>>,
}

impl<S: DocumentSchema> RegisteredType<S> {
    pub fn new(schema: S, store: Arc<dyn EntityStore<S::Entity>>) -> Self {
        Self { schema, store }
    }
}

#[async_trait]
impl<S: DocumentSchema> DocumentType for RegisteredType<S> {
    fn name(&self) -> &'static str {
        S::NAME
    }

    fn index(&self) -> &'static str {
        S::INDEX
    }

    fn update_document(&self) -> bool {
        S::UPDATE_DOCUMENT
    }

    fn mapping(&self, analyzers: &AnalyzerBuilder, locales: &[Locale]) -> Mapping {
        self.schema.mapping(analyzers, locales)
    }

    async fn prepare_queryset(&self, ids: &[EntityId]) -> Result<Vec<PreparedAction>, IndexingError> {
        let rows = self.store.get_queryset(ids).await?;
        debug!(
            doc_type = S::NAME,
            requested = ids.len(),
            loaded = rows.len(),
            "Loaded queryset"
        );
        Ok(rows
            .iter()
            .map(|row| self.schema.prepare_action(row))
            .collect())
    }

    async fn ids(&self, window: &UpdatedWindow) -> Result<Vec<EntityId>, IndexingError> {
        self.store.ids(window).await
    }
}

/// Relational accessors for the standard document types.
pub struct EntityStores {
    pub wiki: Arc<dyn EntityStore<WikiArticle>>,
    pub question: Arc<dyn EntityStore<Question>>,
    pub profile: Arc<dyn EntityStore<Profile>>,
    pub forum: Arc<dyn EntityStore<ForumPost>>,
}

/// Registry of every document type, in registration order.
#[derive(Default)]
pub struct DocumentRegistry {
    types: Vec<Arc<dyn DocumentType>>,
    by_name: BTreeMap<&'static str, usize>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the wiki, question, profile and forum types.
    pub fn standard(stores: EntityStores) -> Result<Self, IndexingError> {
        let mut registry = Self::new();
        registry.register(Arc::new(RegisteredType::new(WikiDocument, stores.wiki)))?;
        registry.register(Arc::new(RegisteredType::new(QuestionDocument, stores.question)))?;
        registry.register(Arc::new(RegisteredType::new(ProfileDocument, stores.profile)))?;
        registry.register(Arc::new(RegisteredType::new(ForumDocument, stores.forum)))?;
        Ok(registry)
    }

    /// Add a type. Names and indices must be unique.
    pub fn register(&mut self, doc_type: Arc<dyn DocumentType>) -> Result<(), IndexingError> {
        let name = doc_type.name();
        if self.by_name.contains_key(name) {
            return Err(IndexingError::DuplicateDocumentType(name.to_string()));
        }
        if self.types.iter().any(|t| t.index() == doc_type.index()) {
            return Err(IndexingError::DuplicateDocumentType(format!(
                "{} (index {} is taken)",
                name,
                doc_type.index()
            )));
        }

        self.by_name.insert(name, self.types.len());
        self.types.push(doc_type);
        Ok(())
    }

    pub fn all_types(&self) -> &[Arc<dyn DocumentType>] {
        &self.types
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn DocumentType>, IndexingError> {
        self.by_name
            .get(name)
            .map(|&position| Arc::clone(&self.types[position]))
            .ok_or_else(|| IndexingError::UnknownDocumentType(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.types.iter().map(|t| t.name()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryStore;
    use chrono::Utc;

    fn stores() -> EntityStores {
        EntityStores {
            wiki: Arc::new(MemoryStore::<WikiArticle>::new(vec![])),
            question: Arc::new(MemoryStore::<Question>::new(vec![])),
            profile: Arc::new(MemoryStore::new(vec![Profile {
                user_id: 4,
                username: "kim".to_string(),
                name: None,
                is_active: true,
                involved_from: None,
                product_ids: vec![],
                group_ids: vec![],
                updated: Utc::now(),
            }])),
            forum: Arc::new(MemoryStore::<ForumPost>::new(vec![])),
        }
    }

    #[test]
    fn test_standard_registry() {
        let registry = DocumentRegistry::standard(stores()).unwrap();
        assert_eq!(
            registry.names(),
            vec!["WikiDocument", "QuestionDocument", "ProfileDocument", "ForumDocument"]
        );
        assert_eq!(registry.get("ProfileDocument").unwrap().index(), "user");
        assert!(registry.get("WikiDocument").unwrap().update_document());
    }

    #[test]
    fn test_unknown_type() {
        let registry = DocumentRegistry::standard(stores()).unwrap();
        assert!(matches!(
            registry.get("NoSuchDocument"),
            Err(IndexingError::UnknownDocumentType(name)) if name == "NoSuchDocument"
        ));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = DocumentRegistry::standard(stores()).unwrap();
        let again = RegisteredType::new(
            ForumDocument,
            Arc::new(MemoryStore::<ForumPost>::new(vec![])) as Arc<dyn EntityStore<ForumPost>>,
        );
        assert!(matches!(
            registry.register(Arc::new(again)),
            Err(IndexingError::DuplicateDocumentType(_))
        ));
    }

    #[test]
    fn test_field_names() {
        let registry = DocumentRegistry::standard(stores()).unwrap();
        let fields = registry.get("WikiDocument").unwrap().field_names();
        assert!(fields.contains(&"product_ids".to_string()));
        assert!(fields.contains(&"title".to_string()));
    }

    #[tokio::test]
    async fn test_prepare_queryset_skips_missing_rows() {
        let registry = DocumentRegistry::standard(stores()).unwrap();
        let actions = registry
            .get("ProfileDocument")
            .unwrap()
            .prepare_queryset(&[4, 5])
            .await
            .unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].id(), "4");
    }
}
