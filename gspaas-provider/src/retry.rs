//! Retry - Repeat an idempotent call while it fails transiently
//!
//! Only reads go through here. Mutating calls are not idempotent and are
//! never retried by the provider.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::client::ApiResult;

/// How long and how often a call is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts
    pub interval: Duration,
    /// Total time budget across all attempts
    pub max_elapsed: Duration,
}

impl RetryPolicy {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);
    pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(60);

    /// A policy that makes exactly one attempt
    pub fn none() -> Self {
        Self {
            interval: Duration::ZERO,
            max_elapsed: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            max_elapsed: Self::DEFAULT_MAX_ELAPSED,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the budget is spent
pub async fn retry<T, F, Fut>(policy: RetryPolicy, what: &str, mut op: F) -> ApiResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ApiResult<T>>,
{
    let started = Instant::now();
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && started.elapsed() + policy.interval < policy.max_elapsed => {
                log::warn!("{} failed (attempt {}), retrying: {}", what, attempt, e);
                tokio::time::sleep(policy.interval).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick() -> RetryPolicy {
        RetryPolicy {
            interval: Duration::from_millis(1),
            max_elapsed: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry(quick(), "list networks", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ApiError::status(503, "busy"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_returned_immediately() {
        let calls = AtomicU32::new(0);
        let result: ApiResult<()> = retry(quick(), "list networks", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::status(400, "bad request")) }
        })
        .await;

        assert_eq!(result, Err(ApiError::status(400, "bad request")));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_budget_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: ApiResult<()> = retry(RetryPolicy::none(), "list networks", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::Transport("connection reset".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
