//! Backoff policy for establishing completion requests
//!
//! A request that fails before any reply text arrives may be attempted again
//! when the failure is transient: connection trouble or a 5xx status from the
//! provider. Rate limiting and rejected credentials go straight back to the
//! user.
//!
//! Delays grow geometrically from `initial_delay`, are capped at `max_delay`,
//! and are spread by up to `jitter_factor` of their length in either
//! direction.
//!
//! ```rust,no_run
//! use groq_engineer::retry::{RetryConfig, retry_transient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = RetryConfig::new()
//!     .with_max_attempts(4)
//!     .with_initial_delay(Duration::from_millis(250));
//!
//! let answer = retry_transient(policy, || async { Ok::<_, groq_engineer::Error>(42) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;

/// How often and how patiently to re-attempt a request
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Growth factor applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
    /// Random spread as a fraction of the delay (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(20),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier.max(1.0);
        self
    }

    pub fn with_jitter_factor(mut self, jitter: f64) -> Self {
        self.jitter_factor = jitter.clamp(0.0, 1.0);
        self
    }

    /// Pause before attempt `failed + 1`, where `failed` counts from 0
    fn delay_after(&self, failed: u32) -> Duration {
        let grown = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(failed as i32);
        let capped = grown.min(self.max_delay.as_secs_f64());

        let spread = capped * self.jitter_factor;
        let offset = if spread > 0.0 {
            (rand::random::<f64>() * 2.0 - 1.0) * spread
        } else {
            0.0
        };

        Duration::from_secs_f64((capped + offset).max(0.0))
    }
}

/// Whether a failed attempt is worth repeating
///
/// `Network` errors and provider errors carrying a 500, 502, 503 or 504
/// status qualify. Everything else is final.
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Network(_) => true,
        Error::Provider {
            status: Some(status),
            ..
        } => matches!(status, 500 | 502 | 503 | 504),
        _ => false,
    }
}

/// Run `attempt` until it succeeds, fails for good, or the policy runs out
///
/// A non-retryable error is returned immediately. After the last transient
/// failure that error is returned.
pub async fn retry_transient<F, Fut, T>(policy: RetryConfig, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut failed = 0;

    loop {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        failed += 1;
        if !is_retryable_error(&err) || failed >= attempts {
            return Err(err);
        }

        let delay = policy.delay_after(failed - 1);
        log::warn!(
            "Attempt {}/{} failed ({}), retrying in {:?}",
            failed,
            attempts,
            err,
            delay
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(attempts: u32) -> RetryConfig {
        RetryConfig::new()
            .with_max_attempts(attempts)
            .with_initial_delay(Duration::from_millis(1))
            .with_jitter_factor(0.0)
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let policy = RetryConfig::new()
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_millis(3500))
            .with_backoff_multiplier(2.0)
            .with_jitter_factor(0.0);

        assert_eq!(policy.delay_after(0), Duration::from_secs(1));
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_millis(3500));
        assert_eq!(policy.delay_after(8), Duration::from_millis(3500));
    }

    #[test]
    fn test_jitter_stays_within_spread() {
        let policy = RetryConfig::new()
            .with_initial_delay(Duration::from_millis(1000))
            .with_jitter_factor(0.2);

        for _ in 0..50 {
            let delay = policy.delay_after(0);
            assert!(delay >= Duration::from_millis(799));
            assert!(delay <= Duration::from_millis(1201));
        }
    }

    #[test]
    fn test_builder_clamps() {
        let policy = RetryConfig::new()
            .with_max_attempts(0)
            .with_backoff_multiplier(0.5)
            .with_jitter_factor(3.0);

        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff_multiplier, 1.0);
        assert_eq!(policy.jitter_factor, 1.0);
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error(&Error::network("connection reset")));
        assert!(is_retryable_error(&Error::provider_status(
            503,
            "503 Service Unavailable: busy"
        )));
        assert!(!is_retryable_error(&Error::provider_status(
            400,
            "500 tokens exceeds the limit"
        )));
        // Only the status decides, never the wording
        assert!(!is_retryable_error(&Error::provider("503 from a stream payload")));
        assert!(!is_retryable_error(&Error::provider_status(501, "not implemented")));
        assert!(!is_retryable_error(&Error::rate_limit("slow down")));
        assert!(!is_retryable_error(&Error::authentication("Invalid API Key")));
        assert!(!is_retryable_error(&Error::config("Invalid config")));
    }

    #[tokio::test]
    async fn test_first_success_makes_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry_transient(fast(3), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, Error>("ok") }
        })
        .await
        .unwrap();

        assert_eq!(value, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = retry_transient(fast(3), move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(Error::network("timed out"))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_transient(fast(2), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Error::provider_status(502, "502 Bad Gateway: upstream")) }
        })
        .await;

        assert!(matches!(result, Err(Error::Provider { status: Some(502), .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rate_limit_is_returned_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_transient(fast(5), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(Error::rate_limit("Too many requests")) }
        })
        .await;

        assert!(matches!(result, Err(Error::RateLimit(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
