//! Dependency initialization and wiring for the support search binary.

use std::sync::Arc;

use support_search_pipeline::{DocumentRegistry, IndexManager, Indexer};
use support_search_query::CompoundSearch;
use support_search_repository::{
    AnalysisConfig, AnalyzerBuilder, IndexNaming, OpenSearchClient, SearchEngineClient,
    SynonymCatalog,
};
use support_search_shared::Product;
use tracing::info;

use crate::config::Settings;
use crate::fixtures::Fixtures;
use crate::AppError;

/// Container for all initialized dependencies.
pub struct Dependencies {
    pub settings: Settings,
    pub client: Arc<dyn SearchEngineClient>,
    pub indexer: Arc<Indexer>,
    pub indices: IndexManager,
    pub search: CompoundSearch,
    /// Product catalog used to validate search scopes.
    pub products: Vec<Product>,
}

impl Dependencies {
    /// Connect to OpenSearch and load the entity exports.
    pub async fn new(settings: Settings) -> Result<Self, AppError> {
        info!(
            opensearch_url = %settings.engine.url,
            index_prefix = %settings.index_prefix,
            "Initializing dependencies"
        );

        let client = OpenSearchClient::new(&settings.engine)
            .await
            .map_err(|e| AppError::setup(format!("Failed to create OpenSearch client: {}", e)))?;
        let fixtures = Fixtures::load(settings.fixtures_dir.as_deref())?;

        Self::from_parts(settings, Arc::new(client), fixtures)
    }

    /// Wire the dependencies around an existing client.
    pub fn from_parts(
        settings: Settings,
        client: Arc<dyn SearchEngineClient>,
        fixtures: Fixtures,
    ) -> Result<Self, AppError> {
        let synonyms = match &settings.synonyms_dir {
            Some(dir) => SynonymCatalog::from_dir(dir)?,
            None => SynonymCatalog::builtin(),
        };
        let analyzers = AnalyzerBuilder::new(AnalysisConfig {
            use_plugins: settings.use_plugins,
            synonyms,
        });

        let registry = Arc::new(DocumentRegistry::standard(fixtures.stores)?);
        let naming = IndexNaming::new(settings.index_prefix.clone());

        let indexer = Arc::new(Indexer::new(
            Arc::clone(&client),
            Arc::clone(&registry),
            naming.clone(),
            settings.indexer.clone(),
        ));
        let indices = IndexManager::new(
            Arc::clone(&client),
            registry,
            naming.clone(),
            settings.engine.clone(),
            analyzers,
            settings.locales.supported().to_vec(),
        );
        let search = CompoundSearch::new(Arc::clone(&client), naming);

        Ok(Self {
            settings,
            client,
            indexer,
            indices,
            search,
            products: fixtures.products,
        })
    }

    /// Fail unless the engine reports itself healthy.
    pub async fn verify_engine(&self) -> Result<(), AppError> {
        let healthy = self
            .client
            .health_check()
            .await
            .map_err(|e| AppError::setup(format!("OpenSearch health check failed: {}", e)))?;

        if !healthy {
            return Err(AppError::setup("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");
        Ok(())
    }
}
