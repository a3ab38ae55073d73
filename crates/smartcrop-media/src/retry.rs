//! Retry utilities with exponential backoff.
//!
//! Used around detector calls, which may be slow or flaky when the
//! backend runs out of process.

use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Backoff policy for a retried operation.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each later one
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Shown in retry logs
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Sum of all backoff delays when every retry is used.
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_retries)
            .map(|attempt| self.delay_for_attempt(attempt))
            .sum()
    }

    /// Delay before retry number `attempt` (1-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    /// Operation succeeded.
    Success(T),
    /// Operation failed on its last attempt, or with a non-retryable error.
    Failed { error: E, attempts: u32 },
}

impl<T, E> RetryResult<T, E> {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryResult::Success(_))
    }

    /// Convert into a plain result, dropping the attempt count.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryResult::Success(value) => Ok(value),
            RetryResult::Failed { error, .. } => Err(error),
        }
    }
}

/// Run `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or runs out of retries.
///
/// # Example
/// ```ignore
/// let config = RetryConfig::new("face_detection").with_max_retries(2);
/// let result = retry_async(&config, || provider.detect(&frame), |e| !matches!(e, MediaError::Cancelled)).await;
/// ```
pub async fn retry_async<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation: F,
    should_retry: P,
) -> RetryResult<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return RetryResult::Success(value),
            Err(e) if attempt < config.max_retries && should_retry(&e) => {
                attempt += 1;
                let delay = config.delay_for_attempt(attempt);
                debug!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    config.operation_name, attempt, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return RetryResult::Failed {
                    error: e,
                    attempts: attempt + 1,
                }
            }
        }
    }
}
