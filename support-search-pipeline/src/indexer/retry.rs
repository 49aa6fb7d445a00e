//! Fixed-backoff retry of engine requests.

use std::future::Future;
use std::time::Duration;

use support_search_repository::SearchError;
use tracing::{debug, info, warn};

use crate::errors::IndexingError;

/// Run `request` until it succeeds, retrying transport failures after
/// `backoff` at most `max_retries` times.
///
/// Non-transient engine errors are returned at once. Exhausted retries
/// surface as `IndexingError::Transport` carrying the last error.
pub async fn with_retry<T, F, Fut>(
    operation: &str,
    max_retries: u32,
    backoff: Duration,
    mut request: F,
) -> Result<T, IndexingError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SearchError>>,
{
    let mut last_error: Option<SearchError> = None;

    for attempt in 0..=max_retries {
        match request().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(operation, attempt = attempt, "Request succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                if !e.is_transient() {
                    debug!(operation, error = %e, "Non-retryable error encountered");
                    return Err(IndexingError::SearchError(e));
                }

                if attempt < max_retries {
                    warn!(
                        operation,
                        attempt = attempt + 1,
                        max_retries = max_retries,
                        delay_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Request failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(IndexingError::Transport {
        attempts: max_retries + 1,
        source: last_error
            .unwrap_or_else(|| SearchError::connection(format!("{} was never sent", operation))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_backoff_equals_timeout() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = with_retry("bulk", 3, Duration::from_secs(5), || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < 2 {
                    Err(SearchError::timeout("slow"))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10));
        assert!(elapsed < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("bulk", 2, Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SearchError::connection("refused")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(
            result,
            Err(IndexingError::Transport { attempts: 3, source: SearchError::ConnectionError(_) })
        ));
    }

    #[tokio::test]
    async fn test_query_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry("update_by_query", 3, Duration::from_secs(1), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SearchError::query("bad script")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(IndexingError::SearchError(_))));
    }
}
