//! Bounded retry with exponential backoff for transient external failures.

use crate::error::{PubmetaError, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempt budget and backoff for transient external failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, fails with a non-transient error, or the
    /// attempt budget is exhausted. The last error is returned.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() || attempt >= attempts => return Err(e),
                Err(PubmetaError::RateLimited(secs)) => {
                    let wait = Duration::from_secs(secs).max(backoff);
                    warn!(what, attempt, wait_secs = wait.as_secs(), "Rate limited, waiting");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    debug!(what, attempt, error = %e, "Attempt failed, retrying");
                    tokio::time::sleep(backoff).await;
                }
            }
            backoff *= 2;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let result = policy
            .run("test", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(PubmetaError::Parse("flaky".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.expect("should succeed"), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::default();
        let result: Result<()> = policy
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PubmetaError::Api {
                    code: 503,
                    message: "down".into(),
                })
            })
            .await;
        assert!(matches!(result, Err(PubmetaError::Api { code: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::default()
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(PubmetaError::Captcha)
            })
            .await;
        assert!(matches!(result, Err(PubmetaError::Captcha)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
