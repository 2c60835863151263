//! Retry with exponential backoff and a pluggable retry predicate.
//!
//! The combinator here knows nothing about HTTP. Callers decide which
//! failures are worth another attempt through the predicate.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: u32,
    /// Base unit of the exponential backoff.
    pub backoff_factor: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 9,
            backoff_factor: Duration::from_millis(50),
        }
    }
}

impl RetryConfig {
    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the backoff factor.
    pub fn with_backoff_factor(mut self, factor: Duration) -> Self {
        self.backoff_factor = factor;
        self
    }

    /// Disable retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Delay to wait before the given attempt (0-indexed).
    ///
    /// The initial attempt runs immediately; attempt `n` waits
    /// `2^n * backoff_factor`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let multiplier = 2u32.saturating_pow(attempt);
        self.backoff_factor.saturating_mul(multiplier)
    }
}

/// Retry predicate that retries every failure.
pub fn always_retry<E>(_error: &E, _attempt: u32) -> bool {
    true
}

/// Run `operation` until it succeeds, the predicate declines, or the retry
/// budget is spent.
///
/// The predicate receives the failure and the 0-indexed attempt that
/// produced it. When retries stop, the last error is returned unchanged.
pub async fn execute_with_retry<T, E, F, Fut, P>(
    config: &RetryConfig,
    mut operation: F,
    mut should_retry: P,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: FnMut(&E, u32) -> bool,
    E: Display,
{
    let mut attempt = 0;

    loop {
        let delay = config.delay_for(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let next_delay = config.delay_for(attempt + 1);
        if attempt < config.max_retries && should_retry(&err, attempt) {
            warn!(
                attempt = attempt + 1,
                max_retries = config.max_retries,
                delay_ms = next_delay.as_millis() as u64,
                error = %err,
                "Operation failed, retrying"
            );
            attempt += 1;
            continue;
        }

        warn!(
            attempts = attempt + 1,
            max_retries = config.max_retries,
            delay_ms = next_delay.as_millis() as u64,
            error = %err,
            "Operation failed, giving up"
        );
        return Err(err);
    }
}
