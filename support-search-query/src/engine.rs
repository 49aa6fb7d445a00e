//! Compound search across the content indices.

use std::sync::Arc;

use support_search_repository::{IndexNaming, SearchEngineClient};
use support_search_shared::{Locale, Product};
use tracing::{debug, info, instrument, warn};

use crate::config::{config_for, QueryConfig, WikiQuery};
use crate::dsl::{popular_body, search_body, Target};
use crate::errors::QueryError;
use crate::form::SearchRequest;
use crate::hit::{Hit, SearchHits};
use crate::kinds::SearchKind;
use crate::pagination::{check_page, Pagination};
use crate::results::{SearchResult, SearchResponse};

/// Runs one query over several indices and merges the hits by score.
pub struct CompoundSearch {
    client: Arc<dyn SearchEngineClient>,
    naming: IndexNaming,
}

impl CompoundSearch {
    pub fn new(client: Arc<dyn SearchEngineClient>, naming: IndexNaming) -> Self {
        Self { client, naming }
    }

    /// Answer a validated search request.
    ///
    /// Pages outside `1..=MAX_PAGE` are invalid requests. No engine call is
    /// made when the request selects no kinds. When nothing matches and the
    /// request asks for it, the most popular articles are returned as
    /// `fallback_results`.
    #[instrument(skip(self, request), fields(q = %request.query, locale = %request.locale, page = request.page))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResponse, QueryError> {
        check_page(request.page)?;
        let product_titles: Vec<String> = request
            .product
            .iter()
            .map(|product| product.title.clone())
            .collect();
        let w = SearchKind::mask(&request.kinds);

        if request.kinds.is_empty() {
            debug!("No search types selected");
            return Ok(SearchResponse {
                num_results: 0,
                total: 0,
                results: Vec::new(),
                fallback_results: None,
                product_titles,
                q: request.query.clone(),
                w,
                pagination: Pagination::new(request.page, 0),
            });
        }

        let indices: Vec<(&'static dyn QueryConfig, String)> = request
            .kinds
            .iter()
            .map(|kind| {
                let config = config_for(*kind);
                (config, self.naming.index(config.index()))
            })
            .collect();
        let targets: Vec<Target<'_>> = indices
            .iter()
            .map(|(config, index)| Target {
                config: *config,
                index: index.as_str(),
            })
            .collect();

        let body = search_body(
            &request.query,
            &targets,
            &request.locale,
            request.product.as_ref(),
            request.page,
        );
        let names: Vec<String> = indices.iter().map(|(_, index)| index.clone()).collect();
        let response = self.client.search(&names, &body).await?;
        let hits = SearchHits::from_json(&response)?;

        let results = collect_results(&hits, |hit| make_result(&targets, hit, &request.locale));

        let fallback_results = if hits.total == 0 && request.popular_fallback {
            Some(
                self.popular(&request.locale, request.product.as_ref())
                    .await?,
            )
        } else {
            None
        };

        info!(
            total = hits.total,
            returned = results.len(),
            fallback = fallback_results.is_some(),
            "Search completed"
        );

        Ok(SearchResponse {
            num_results: results.len(),
            total: hits.total,
            results,
            fallback_results,
            product_titles,
            q: request.query.clone(),
            w,
            pagination: Pagination::new(request.page, hits.total),
        })
    }

    /// The most visited articles of `locale`, optionally within `product`.
    #[instrument(skip(self, product), fields(locale = %locale))]
    pub async fn popular(
        &self,
        locale: &Locale,
        product: Option<&Product>,
    ) -> Result<Vec<SearchResult>, QueryError> {
        let index = self.naming.index(WikiQuery.index());
        let response = self
            .client
            .search(std::slice::from_ref(&index), &popular_body(locale, product))
            .await?;

        let hits = SearchHits::from_json(&response)?;
        Ok(collect_results(&hits, |hit| WikiQuery.make_result(hit, locale)))
    }
}

/// Results of every well-formed hit. A hit that cannot be turned into a
/// result is logged and left out rather than failing the page.
fn collect_results<F>(hits: &SearchHits, make: F) -> Vec<SearchResult>
where
    F: Fn(&Hit) -> Result<SearchResult, QueryError>,
{
    hits.hits
        .iter()
        .filter_map(|hit| match make(hit) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(index = %hit.index, id = %hit.id, error = %e, "Skipping malformed hit");
                None
            }
        })
        .collect()
}

/// Build the result of `hit` with the config of the index it came from.
fn make_result(
    targets: &[Target<'_>],
    hit: &Hit,
    locale: &Locale,
) -> Result<SearchResult, QueryError> {
    let target = targets
        .iter()
        .find(|target| target.index == hit.index)
        .ok_or_else(|| QueryError::malformed(format!("hit from unexpected index {}", hit.index)))?;
    target.config.make_result(hit, locale)
}
