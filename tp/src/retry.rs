//! Bounded retry with exponential backoff
//!
//! Shared by the generation client and plan saves. Which failures are worth
//! another attempt is decided by the error type through [`Transient`].

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use planstore::StoreError;
use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::generation::GenerationError;

/// Errors that may succeed when the same operation is attempted again
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for GenerationError {
    fn is_transient(&self) -> bool {
        self.is_retryable()
    }
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Database { .. } | StoreError::Io(_) | StoreError::ChannelError)
    }
}

/// How many times to retry transient failures and how long to wait between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }

    /// A policy that makes exactly one attempt
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails with a permanent error, or attempts run out
    ///
    /// `op` receives the attempt number (0-based). The last error is returned
    /// unchanged when attempts are exhausted.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        E: Transient + Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AttemptFailure<E>>>,
    {
        let mut attempt = 0;
        loop {
            let failure = match op(attempt).await {
                Ok(value) => {
                    debug!(attempt, "RetryPolicy::run: success");
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if !failure.error.is_transient() {
                debug!(attempt, error = %failure.error, "RetryPolicy::run: permanent error");
                return Err(failure.error);
            }
            if attempt >= self.max_retries {
                debug!(attempt, error = %failure.error, "RetryPolicy::run: retries exhausted");
                return Err(failure.error);
            }

            attempt += 1;
            let delay = failure
                .retry_after
                .map_or_else(|| self.backoff(attempt), |d| d.min(self.max_backoff));
            warn!(
                attempt,
                backoff_ms = delay.as_millis() as u64,
                error = %failure.error,
                "retrying after transient error"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// A failed attempt, with the server's requested delay when it sent one
#[derive(Debug)]
pub struct AttemptFailure<E = GenerationError> {
    pub error: E,
    pub retry_after: Option<Duration>,
}

impl<E> From<E> for AttemptFailure<E> {
    fn from(error: E) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    fn server_error() -> GenerationError {
        GenerationError::Api {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_millis(5000),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff(3), Duration::from_millis(4000));
        assert_eq!(policy.backoff(4), Duration::from_millis(5000));
        assert_eq!(policy.backoff(40), Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = fast_policy(3)
            .run(|_| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(AttemptFailure::from(server_error()))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy(2)
            .run(|_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(AttemptFailure::from(server_error()))
                }
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(503));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = fast_policy(5)
            .run(|_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(AttemptFailure::from(GenerationError::EmptyResponse))
                }
            })
            .await;

        assert!(matches!(result, Err(GenerationError::EmptyResponse)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_store_errors_follow_transient_classification() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = fast_policy(3)
            .run(|_| {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(AttemptFailure::from(StoreError::ChannelError))
                    } else {
                        Ok("saved")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "saved");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert!(!StoreError::NotSignedIn.is_transient());
        assert!(!StoreError::NotFound("x".to_string()).is_transient());
    }

    #[tokio::test]
    async fn test_none_policy_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = RetryPolicy::none()
            .run(|_| {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(AttemptFailure::from(server_error()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
