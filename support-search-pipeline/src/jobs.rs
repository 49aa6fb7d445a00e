//! Job queue abstraction.
//!
//! Indexing operations are plain closures handed to a `JobQueue` together
//! with a `RetryPolicy`. A job may run later, on another task, and may run
//! more than once, so every job re-reads current state when it runs.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::IndexingError;

/// A re-runnable unit of work.
pub type Job = Arc<dyn Fn() -> BoxFuture<'static, Result<(), IndexingError>> + Send + Sync>;

/// Wrap an async closure into a `Job`.
pub fn job<F, Fut>(f: F) -> Job
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), IndexingError>> + Send + 'static,
{
    Arc::new(move || Box::pin(f()) as BoxFuture<'static, Result<(), IndexingError>>)
}

/// How often and how patiently a failed job is re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total runs, including the first one.
    pub max_attempts: u32,
    /// Fixed delay between runs.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Run once, never retry.
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// Identifier of a submitted job, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Execution facility for indexing jobs.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn submit(&self, job: Job, policy: RetryPolicy) -> JobId;
}

/// Run `job` until it succeeds, fails with a non-retryable error or runs out
/// of attempts.
pub async fn run_with_retry(id: JobId, job: &Job, policy: RetryPolicy) -> Result<(), IndexingError> {
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        match (**job)().await {
            Ok(()) => {
                if attempt > 1 {
                    info!(job_id = %id, attempt = attempt, "Job succeeded after retry");
                }
                return Ok(());
            }
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                warn!(
                    job_id = %id,
                    attempt = attempt,
                    max_attempts = max_attempts,
                    backoff_ms = policy.backoff.as_millis() as u64,
                    error = %e,
                    "Job failed, retrying"
                );
                tokio::time::sleep(policy.backoff).await;
            }
            Err(e) => {
                error!(job_id = %id, attempt = attempt, error = %e, "Job failed");
                return Err(e);
            }
        }
    }

    Err(IndexingError::job(format!("job {} never ran", id)))
}

/// Runs each job as a task on the current Tokio runtime.
///
/// Only unfinished jobs are tracked: finished ones are dropped on the next
/// `submit`, their failures having been logged when they happened.
#[derive(Default)]
pub struct TokioJobQueue {
    handles: Mutex<Vec<(JobId, JoinHandle<Result<(), IndexingError>>)>>,
}

impl TokioJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tracked jobs, finished or not, since the last prune.
    pub async fn pending(&self) -> usize {
        self.handles.lock().await.len()
    }

    /// Wait for every tracked job and return the failures.
    pub async fn drain(&self) -> Vec<(JobId, IndexingError)> {
        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        let mut failures = Vec::new();

        for (id, handle) in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push((id, e)),
                Err(join_error) => {
                    failures.push((id, IndexingError::job(join_error.to_string())));
                }
            }
        }
        failures
    }
}

#[async_trait]
impl JobQueue for TokioJobQueue {
    async fn submit(&self, job: Job, policy: RetryPolicy) -> JobId {
        let id = JobId::new();
        let handle = tokio::spawn(async move { run_with_retry(id, &job, policy).await });

        let mut handles = self.handles.lock().await;
        handles.retain(|(_, handle)| !handle.is_finished());
        handles.push((id, handle));
        id
    }
}

/// Runs each job to completion inside `submit`.
#[derive(Default)]
pub struct InlineJobQueue {
    outcomes: Mutex<Vec<(JobId, Result<(), IndexingError>)>>,
}

impl InlineJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the outcomes recorded so far.
    pub async fn take_outcomes(&self) -> Vec<(JobId, Result<(), IndexingError>)> {
        self.outcomes.lock().await.drain(..).collect()
    }
}

#[async_trait]
impl JobQueue for InlineJobQueue {
    async fn submit(&self, job: Job, policy: RetryPolicy) -> JobId {
        let id = JobId::new();
        let outcome = run_with_retry(id, &job, policy).await;
        self.outcomes.lock().await.push((id, outcome));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flaky(failures: u32, error: fn() -> IndexingError) -> (Job, Arc<AtomicU32>) {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&runs);
        let job = job(move || {
            let counter = Arc::clone(&counter);
            async move {
                let run = counter.fetch_add(1, Ordering::SeqCst);
                if run < failures {
                    Err(error())
                } else {
                    Ok(())
                }
            }
        });
        (job, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_failure_is_retried() {
        let queue = InlineJobQueue::new();
        let (job, runs) = flaky(2, || IndexingError::store("db down"));

        queue.submit(job, RetryPolicy::default()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 3);
        let outcomes = queue.take_outcomes().await;
        assert!(outcomes[0].1.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_are_bounded() {
        let queue = InlineJobQueue::new();
        let (job, runs) = flaky(10, || IndexingError::store("db down"));

        queue.submit(job, RetryPolicy::default()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 3);
        let outcomes = queue.take_outcomes().await;
        assert!(matches!(outcomes[0].1, Err(IndexingError::StoreError(_))));
    }

    #[tokio::test]
    async fn test_unknown_type_is_not_retried() {
        let queue = InlineJobQueue::new();
        let (job, runs) = flaky(10, || IndexingError::UnknownDocumentType("Nope".to_string()));

        queue.submit(job, RetryPolicy::default()).await;

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_queue_drain() {
        let queue = TokioJobQueue::new();
        let (ok_job, _) = flaky(1, || IndexingError::job("lost worker"));
        let (bad_job, _) = flaky(5, || IndexingError::invalid_option("bad"));

        queue.submit(ok_job, RetryPolicy::default()).await;
        let bad_id = queue.submit(bad_job, RetryPolicy::default()).await;

        let failures = queue.drain().await;
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, bad_id);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_queue_forgets_finished_jobs() {
        let queue = TokioJobQueue::new();
        for _ in 0..5 {
            let (done, _) = flaky(0, || IndexingError::job("unused"));
            queue.submit(done, RetryPolicy::once()).await;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        // Every earlier job had finished when the next one was submitted.
        assert_eq!(queue.pending().await, 1);
        assert!(queue.drain().await.is_empty());
        assert_eq!(queue.pending().await, 0);
    }
}
