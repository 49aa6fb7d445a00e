//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchEngineClient`
//! using the OpenSearch Rust client.

use std::time::Duration;

use async_trait::async_trait;
use opensearch::{
    cluster::ClusterHealthParts,
    http::request::JsonBody,
    http::response::Response,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesDeleteParts, IndicesExistsParts, IndicesRefreshParts},
    params::{Conflicts, Refresh},
    BulkParts, DeleteParts, IndexParts, OpenSearch, SearchParts, UpdateByQueryParts, UpdateParts,
};
use serde_json::{json, Value};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::config::EngineConfig;
use crate::errors::SearchError;
use crate::interfaces::{
    BulkAction, BulkOptions, BulkResponse, ConflictPolicy, SearchEngineClient,
    UpdateByQueryResponse,
};

/// OpenSearch client implementation.
///
/// The client holds no per-request state and is shared by every pipeline
/// and search call through an `Arc<dyn SearchEngineClient>`.
///
/// # Example
///
/// ```ignore
/// use support_search_repository::{EngineConfig, OpenSearchClient, SearchEngineClient};
///
/// let client = OpenSearchClient::new(&EngineConfig::new("http://localhost:9200")).await?;
/// client.index_document("dev_forum", "42", &json!({ "content": "hello" })).await?;
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
    timeout: Duration,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the configured URL.
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If the URL is invalid or the transport cannot be built
    pub async fn new(config: &EngineConfig) -> Result<Self, SearchError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(
            url = %config.url,
            timeout_secs = config.timeout.as_secs(),
            "Created OpenSearch client"
        );

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }
}

/// Classify a transport failure.
fn send_error(err: opensearch::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::timeout(err.to_string())
    } else {
        SearchError::connection(err.to_string())
    }
}

/// Classify an unsuccessful status, falling back to `fallback` for errors the
/// engine attributes to the request itself.
fn status_error(status: u16, body: String, fallback: fn(String) -> SearchError) -> SearchError {
    let msg = format!("status {}: {}", status, body);
    match status {
        408 | 504 => SearchError::timeout(msg),
        429 | 502 | 503 => SearchError::connection(msg),
        _ => fallback(msg),
    }
}

async fn read_json(response: Response) -> Result<Value, SearchError> {
    response
        .json::<Value>()
        .await
        .map_err(|e| SearchError::parse(e.to_string()))
}

/// Turn a non-success response into an error, logging its body.
async fn ensure_success(
    response: Response,
    operation: &str,
    fallback: fn(String) -> SearchError,
) -> Result<Response, SearchError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let error_body = response.text().await.unwrap_or_default();
    error!(status = %status, body = %error_body, operation, "Request failed");
    Err(status_error(status.as_u16(), error_body, fallback))
}

#[async_trait]
impl SearchEngineClient for OpenSearchClient {
    #[instrument(skip(self, body))]
    async fn search(&self, indices: &[String], body: &Value) -> Result<Value, SearchError> {
        let names: Vec<&str> = indices.iter().map(String::as_str).collect();
        let response = self
            .client
            .search(SearchParts::Index(&names))
            .body(body.clone())
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        let response = ensure_success(response, "search", SearchError::QueryError).await?;
        read_json(response).await
    }

    async fn index_document(
        &self,
        index: &str,
        id: &str,
        source: &Value,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(source.clone())
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        ensure_success(response, "index", SearchError::IndexError).await?;
        debug!(index, doc_id = id, "Document indexed");
        Ok(())
    }

    async fn update_document(
        &self,
        index: &str,
        id: &str,
        doc: &Value,
        upsert: bool,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .update(UpdateParts::IndexId(index, id))
            .body(json!({
                "doc": doc,
                "doc_as_upsert": upsert
            }))
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        ensure_success(response, "update", SearchError::UpdateError).await?;
        debug!(index, doc_id = id, "Document updated/created");
        Ok(())
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .delete(DeleteParts::IndexId(index, id))
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        // 404 is acceptable - document may not exist
        if response.status_code().as_u16() == 404 {
            debug!(index, doc_id = id, "Document already absent");
            return Ok(false);
        }

        ensure_success(response, "delete", SearchError::DeleteError).await?;
        debug!(index, doc_id = id, "Document deleted");
        Ok(true)
    }

    #[instrument(skip(self, actions, options), fields(count = actions.len()))]
    async fn bulk(
        &self,
        index: &str,
        actions: &[BulkAction],
        options: &BulkOptions,
    ) -> Result<BulkResponse, SearchError> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(actions.len() * 2);
        for action in actions {
            body.extend(action.to_lines(index).into_iter().map(JsonBody::from));
        }

        let mut request = self
            .client
            .bulk(BulkParts::Index(index))
            .body(body)
            .request_timeout(options.timeout);
        if options.refresh {
            request = request.refresh(Refresh::True);
        }

        let response = request.send().await.map_err(send_error)?;
        let response = ensure_success(response, "bulk", SearchError::BulkIndexError).await?;
        let parsed = BulkResponse::from_json(&read_json(response).await?)?;

        debug!(
            took_ms = parsed.took_ms,
            failed = parsed.failures().count(),
            "Bulk request completed"
        );
        Ok(parsed)
    }

    #[instrument(skip(self, body))]
    async fn update_by_query(
        &self,
        index: &str,
        body: &Value,
        conflicts: ConflictPolicy,
    ) -> Result<UpdateByQueryResponse, SearchError> {
        let conflicts = match conflicts {
            ConflictPolicy::Abort => Conflicts::Abort,
            ConflictPolicy::Proceed => Conflicts::Proceed,
        };
        let response = self
            .client
            .update_by_query(UpdateByQueryParts::Index(&[index]))
            .conflicts(conflicts)
            .body(body.clone())
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        let response =
            ensure_success(response, "update_by_query", SearchError::UpdateByQueryError).await?;
        let parsed = UpdateByQueryResponse::from_json(&read_json(response).await?);
        if parsed.version_conflicts > 0 {
            warn!(
                index,
                version_conflicts = parsed.version_conflicts,
                "Update by query skipped conflicting documents"
            );
        }
        Ok(parsed)
    }

    async fn create_index(&self, index: &str, body: &Value) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(body.clone())
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        ensure_success(response, "create_index", SearchError::IndexCreationError).await?;
        info!(index, "Created index");
        Ok(())
    }

    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(status_error(
                status,
                String::new(),
                SearchError::ConnectionError,
            )),
        }
    }

    async fn delete_index(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .delete(IndicesDeleteParts::Index(&[index]))
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        if response.status_code().as_u16() == 404 {
            return Ok(false);
        }
        ensure_success(response, "delete_index", SearchError::IndexCreationError).await?;
        info!(index, "Deleted index");
        Ok(true)
    }

    async fn refresh(&self, indices: &[String]) -> Result<(), SearchError> {
        let names: Vec<&str> = indices.iter().map(String::as_str).collect();
        let response = self
            .client
            .indices()
            .refresh(IndicesRefreshParts::Index(&names))
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        ensure_success(response, "refresh", SearchError::ConnectionError).await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::None)
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(send_error)?;

        let health = read_json(response).await?;
        let status = health
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        info!(status, "OpenSearch cluster status");

        Ok(status == "green" || status == "yellow")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            status_error(504, String::new(), SearchError::BulkIndexError),
            SearchError::Timeout(_)
        ));
        assert!(matches!(
            status_error(429, String::new(), SearchError::BulkIndexError),
            SearchError::ConnectionError(_)
        ));
        assert!(matches!(
            status_error(400, "bad".to_string(), SearchError::QueryError),
            SearchError::QueryError(msg) if msg == "status 400: bad"
        ));
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_url() {
        let result = OpenSearchClient::new(&EngineConfig::new("not a url")).await;
        assert!(matches!(result, Err(SearchError::ConnectionError(_))));
    }
}
