//! Implementation of the CLI commands.
//!
//! Every command produces a JSON body; a non-success status makes the binary
//! exit with a failure code after printing it.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};
use support_search_pipeline::{
    InlineJobQueue, ReindexAmount, ReindexOptions, ReindexPlan, UpdatedWindow,
};
use support_search_query::{ApiError, QueryError, SearchForm};
use tracing::{error, info, instrument, warn};

use crate::cli::{Command, ReindexArgs, RemoveFromFieldArgs, SearchArgs};
use crate::config::Dependencies;
use crate::AppError;

/// JSON printed by a command, with an HTTP-like status.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub status: u16,
    pub body: Value,
}

impl Output {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}

/// Run `command` against `deps`.
pub async fn execute(command: Command, deps: &Dependencies) -> Result<Output, AppError> {
    match command {
        Command::Reindex(args) => reindex(args, deps).await,
        Command::InitIndices => {
            let created = deps.indices.init_indices().await?;
            Ok(Output::ok(json!({ "created": created })))
        }
        Command::DeleteIndices => {
            let deleted = deps.indices.delete_indices().await?;
            Ok(Output::ok(json!({ "deleted": deleted })))
        }
        Command::Search(args) => Ok(search(args, deps).await),
        Command::RemoveFromField(args) => remove_from_field(args, deps).await,
        Command::Health => {
            let healthy = match deps.client.health_check().await {
                Ok(healthy) => healthy,
                Err(e) => {
                    warn!(error = %e, "Health check failed");
                    false
                }
            };
            Ok(Output {
                status: if healthy { 200 } else { 503 },
                body: json!({ "healthy": healthy }),
            })
        }
    }
}

impl ReindexArgs {
    /// Reindex options, with unset sizes taken from the settings.
    pub fn options(&self, deps: &Dependencies) -> ReindexOptions {
        let amount = match (self.count, self.percentage) {
            (Some(count), _) => ReindexAmount::Count(count),
            (None, Some(percentage)) => ReindexAmount::Percentage(percentage),
            (None, None) => ReindexAmount::All,
        };
        let indexer = &deps.settings.indexer;

        ReindexOptions {
            types: self.limit.clone(),
            amount,
            sql_chunk_size: self.sql_chunk_size,
            elastic_chunk_size: self.elastic_chunk_size.unwrap_or(indexer.chunk_size),
            timeout: self
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(indexer.timeout),
            window: UpdatedWindow {
                before: self.updated_before,
                after: self.updated_after,
            },
            print_sql_count: self.print_sql_count,
        }
    }
}

#[instrument(skip_all)]
async fn reindex(args: ReindexArgs, deps: &Dependencies) -> Result<Output, AppError> {
    let options = args.options(deps);
    let plan = ReindexPlan::build(deps.indexer.registry(), options).await?;

    let counts: serde_json::Map<String, Value> = plan
        .counts()
        .into_iter()
        .map(|(doc_type, count)| (doc_type.to_string(), json!(count)))
        .collect();
    if args.print_sql_count {
        return Ok(Output::ok(json!({ "counts": counts })));
    }

    // The CLI runs every job in-process, one after the other.
    let queue = InlineJobQueue::new();
    let submitted = plan
        .enqueue(deps.indexer.clone(), &queue, deps.settings.job_policy)
        .await;

    let failures: Vec<Value> = queue
        .take_outcomes()
        .await
        .into_iter()
        .filter_map(|(id, outcome)| outcome.err().map(|e| (id, e)))
        .map(|(id, e)| {
            error!(job_id = %id, error = %e, "Reindex job failed");
            json!({ "job": id.to_string(), "error": e.to_string() })
        })
        .collect();

    info!(jobs = submitted.len(), failed = failures.len(), "Reindex finished");
    Ok(Output {
        status: if failures.is_empty() { 200 } else { 500 },
        body: json!({ "counts": counts, "jobs": submitted.len(), "failures": failures }),
    })
}

async fn search(args: SearchArgs, deps: &Dependencies) -> Output {
    let mut params = HashMap::new();
    params.insert("q".to_string(), args.q);
    for (key, value) in [
        ("w", args.w),
        ("page", args.page),
        ("locale", args.locale),
        ("product", args.product),
    ] {
        if let Some(value) = value {
            params.insert(key.to_string(), value);
        }
    }

    let outcome = match SearchForm::parse(&params, &deps.settings.locales, &deps.products) {
        Ok(request) => deps.search.search(&request).await,
        Err(e) => Err(e),
    };
    match outcome.and_then(|response| {
        serde_json::to_value(response)
            .map_err(|e| QueryError::malformed(e.to_string()))
    }) {
        Ok(body) => Output::ok(body),
        Err(e) => {
            let api_error = ApiError::from(e);
            Output {
                status: api_error.status,
                body: json!({ "error": api_error.error }),
            }
        }
    }
}

async fn remove_from_field(
    args: RemoveFromFieldArgs,
    deps: &Dependencies,
) -> Result<Output, AppError> {
    let value = serde_json::from_str(&args.value).unwrap_or(Value::String(args.value.clone()));
    let response = deps
        .indexer
        .remove_from_field(&args.doc_type, &args.field, value)
        .await?;

    Ok(Output::ok(json!({
        "total": response.total,
        "updated": response.updated,
        "version_conflicts": response.version_conflicts,
    })))
}
