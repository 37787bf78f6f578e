//! Resilience wrapper for single-shot (non-streaming) calls.
//!
//! Two orthogonal pieces:
//!
//! - [`with_timeout`] races an operation against a timer and surfaces a
//!   distinguishable [`EventwireError::Timeout`]
//! - [`with_retry`] re-runs a failed operation under an exponential
//!   backoff schedule with jitter, consulting a predicate to separate
//!   retryable from fatal errors
//!
//! The streaming path never retries: a stream, once open, is not
//! silently resumed; the caller reissues the whole request.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::debug;

use crate::error::{EventwireError, Result};

/// Backoff schedule for [`with_retry`]. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay: Duration,
    /// Cap applied to the computed delay, before jitter.
    pub max_delay: Duration,
    /// Multiplier applied per attempt.
    pub backoff_multiplier: f64,
    /// Random jitter added on top of the delay, as a fraction of it:
    /// the actual sleep is `delay + uniform(0, delay * jitter_fraction)`.
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter_fraction: 0.25,
        }
    }
}

impl RetryConfig {
    /// Base delay after the failed attempt `attempt` (0-based), without
    /// jitter: `min(max_delay, initial_delay * multiplier^attempt)`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }

    fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter_fraction <= 0.0 {
            return base;
        }
        let span = base.as_secs_f64() * self.jitter_fraction;
        let jitter = rand::thread_rng().gen_range(0.0..=span);
        base + Duration::from_secs_f64(jitter)
    }
}

/// Default retry predicate: connectivity and server-side failures are
/// retryable; client-side rejections are not.
pub fn default_should_retry(error: &EventwireError, _attempt: u32) -> bool {
    match error {
        EventwireError::Http(err) => {
            err.is_connect()
                || err.is_timeout()
                || err.status().is_some_and(|status| status.is_server_error())
        }
        EventwireError::Status { status, .. } => status.is_server_error(),
        EventwireError::Timeout { .. } => true,
        _ => false,
    }
}

/// Invoke `operation`, retrying retryable failures under `config`.
///
/// On each failure `should_retry(&error, attempt)` decides whether to
/// continue; a fatal verdict or exhausted attempts raises
/// [`EventwireError::RetriesExhausted`] naming the attempts made and
/// wrapping the last underlying error's message.
pub async fn with_retry<T, F, Fut, P>(
    config: &RetryConfig,
    should_retry: P,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&EventwireError, u32) -> bool,
{
    let max_attempts = config.max_attempts.max(1);

    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let attempts_made = attempt + 1;
                if !should_retry(&error, attempt) || attempts_made >= max_attempts {
                    return Err(EventwireError::RetriesExhausted {
                        attempts: attempts_made,
                        last: error.to_string(),
                    });
                }

                let delay = config.jittered_delay(attempt);
                debug!(attempt, ?delay, error = %error, "retrying after failure");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// Race `future` against a timer.
///
/// On expiry raises [`EventwireError::Timeout`] naming the operation
/// and the duration, so callers can special-case timeouts.
pub async fn with_timeout<T, Fut>(future: Fut, duration: Duration, label: &str) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    match tokio::time::timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(EventwireError::Timeout {
            label: label.to_string(),
            duration,
        }),
    }
}
