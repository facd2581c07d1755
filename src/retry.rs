//! Retry of read-modify-write sequences that lost an optimistic version check.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::{Result, StorefrontError};

/// Backoff applied when a versioned write reports [`StorefrontError::Conflict`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { min_delay: Duration::from_millis(20), max_delay: Duration::from_millis(500), max_retries: 3 }
    }
}

impl RetryPolicy {
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Runs `op`, re-running it from the start while it fails with a conflict.
/// Any other error, or a conflict after the last retry, is returned as is.
pub async fn retry_on_conflict<T, F, Fut>(policy: &RetryPolicy, operation: &'static str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    op.retry(policy.backoff())
        .when(StorefrontError::is_conflict)
        .notify(|_: &StorefrontError, delay: Duration| {
            warn!(operation, delay = ?delay, "Version conflict, retrying");
        })
        .await
}
