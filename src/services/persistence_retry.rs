//! Retry and timeout policy for collaborator I/O.
//!
//! Every port call made by the orchestration service goes through
//! [`IoPolicy::execute`], which bounds the call with a timeout and retries
//! transient storage failures with exponential backoff. Concurrency conflicts
//! are passed straight back: the caller resolves them by re-reading state.
//!
//! Writes go through [`IoPolicy::execute_write`] instead. A write that timed out
//! may already have committed, so it is never replayed blindly; the caller
//! re-reads and reconciles.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{IoConfig, RetryConfig};

/// Timeout budget plus backoff schedule for one class of port calls.
#[derive(Debug, Clone)]
pub struct IoPolicy {
    /// Maximum number of retries before giving up
    pub max_retries: u32,

    /// Initial backoff duration in milliseconds
    pub initial_backoff_ms: u64,

    /// Maximum backoff duration in milliseconds
    pub max_backoff_ms: u64,

    /// Budget for each individual attempt in milliseconds
    pub timeout_ms: u64,
}

impl Default for IoPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default(), &IoConfig::default())
    }
}

impl IoPolicy {
    pub const fn from_config(retry: &RetryConfig, io: &IoConfig) -> Self {
        Self {
            max_retries: retry.max_retries,
            initial_backoff_ms: retry.initial_backoff_ms,
            max_backoff_ms: retry.max_backoff_ms,
            timeout_ms: io.timeout_ms,
        }
    }

    /// Run `operation` under the timeout, retrying transient storage failures.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        self.run(operation_name, Replay::StorageErrorsAndTimeouts, operation).await
    }

    /// Like [`execute`](Self::execute), but a timed-out attempt is returned
    /// rather than retried. Only failures reported by storage are replayed.
    pub async fn execute_write<F, Fut, T>(&self, operation_name: &str, operation: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        self.run(operation_name, Replay::StorageErrorsOnly, operation).await
    }

    async fn run<F, Fut, T>(&self, operation_name: &str, replay: Replay, mut operation: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        let schedule = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(self.initial_backoff_ms))
            .with_max_interval(Duration::from_millis(self.max_backoff_ms.max(self.initial_backoff_ms)))
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build();

        let budget = Duration::from_millis(self.timeout_ms);
        let max_retries = self.max_retries;
        let timeout_ms = self.timeout_ms;
        let mut attempt: u32 = 0;

        backoff::future::retry(schedule, || {
            let current = attempt;
            attempt += 1;
            let call = operation();
            async move {
                let result = match tokio::time::timeout(budget, call).await {
                    Ok(result) => result,
                    Err(_) => Err(DomainError::Timeout {
                        operation: operation_name.to_string(),
                        budget_ms: timeout_ms,
                    }),
                };

                match result {
                    Ok(value) => {
                        if current > 0 {
                            debug!(operation = operation_name, retries = current, "Call succeeded after retry");
                        }
                        Ok(value)
                    }
                    Err(err) if replay.allows(&err) && current < max_retries => {
                        warn!(
                            operation = operation_name,
                            attempt = current + 1,
                            error = %err,
                            "Transient failure, retrying"
                        );
                        Err(backoff::Error::transient(err))
                    }
                    Err(err) => Err(backoff::Error::permanent(err)),
                }
            }
        })
        .await
    }
}

#[derive(Debug, Clone, Copy)]
enum Replay {
    StorageErrorsAndTimeouts,
    StorageErrorsOnly,
}

impl Replay {
    const fn allows(self, err: &DomainError) -> bool {
        match self {
            Self::StorageErrorsAndTimeouts => matches!(err, DomainError::Persistence(_) | DomainError::Timeout { .. }),
            Self::StorageErrorsOnly => matches!(err, DomainError::Persistence(_)),
        }
    }
}
