//! Retry with exponential backoff around the flashcard generation call.
//!
//! Rate limits and overload responses are retried; credential, request and
//! other upstream failures are returned immediately. Only the final outcome
//! reaches the caller.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use thiserror::Error;

use crate::services::generator::ProviderError;

/// Terminal failure of a generation request, after any retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("The AI service is rate limiting requests. Please wait a minute and try again.")]
    RateLimited,

    #[error("The AI service is temporarily overloaded. Please try again shortly.")]
    ServiceUnavailable,

    #[error("The AI service rejected the configured API key. Check ANTHROPIC_API_KEY.")]
    InvalidCredentials,

    #[error("The AI service rejected the request: {0}")]
    InvalidRequest(String),

    #[error("The AI service failed: {0}")]
    Upstream(String),
}

impl From<ProviderError> for GenerationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::RateLimited { .. } => Self::RateLimited,
            ProviderError::Overloaded(_) => Self::ServiceUnavailable,
            ProviderError::Unauthorized(_) => Self::InvalidCredentials,
            ProviderError::BadRequest(message) => Self::InvalidRequest(message),
            ProviderError::Other(message) => Self::Upstream(message),
        }
    }
}

/// Bounded retry policy with exponential backoff and jitter.
///
/// The wait before retry `n` (zero-based) is `base_delay * 2^n` plus a
/// uniform random amount in `[0, max_jitter]`, unless the provider supplied a
/// `retry_after` hint.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_jitter: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Backoff for the given zero-based attempt, jitter included.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.min(16);
        let base = self.base_delay.saturating_mul(1u32 << exp);

        let jitter_secs = self.max_jitter.as_secs_f64();
        let jitter = if jitter_secs > 0.0 {
            rand::rng().random_range(0.0..=jitter_secs)
        } else {
            0.0
        };

        base + Duration::from_secs_f64(jitter)
    }

    /// Run `operation` until it succeeds, fails fatally, or attempts run out.
    ///
    /// The operation runs at most `max_retries + 1` times.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0u32;

        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            let can_retry = attempt < self.max_retries;
            let delay = match &err {
                ProviderError::RateLimited { retry_after } if can_retry => {
                    retry_after.unwrap_or_else(|| self.backoff_delay(attempt))
                }
                ProviderError::Overloaded(_) if can_retry => self.backoff_delay(attempt),
                _ => {
                    if err.is_retryable() {
                        tracing::error!(attempts = max_attempts, error = %err, "Giving up on flashcard generation");
                    }
                    return Err(err.into());
                }
            };

            tracing::warn!(
                attempt = attempt + 1,
                max_attempts,
                delay_secs = delay.as_secs_f64(),
                "{} (attempt {}/{}), retrying in {:.1}s",
                err,
                attempt + 1,
                max_attempts,
                delay.as_secs_f64()
            );

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}
