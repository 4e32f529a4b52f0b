//! Stage retry policy.
//!
//! Components never retry internally; the pipeline wraps each external
//! stage call in [`with_retries`]. Only upstream failures are retryable —
//! not-found, validation, and config errors are permanent.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use docdraft_shared::{Result, RetryConfig};

/// Caps the doubling exponent so computed delays stay bounded even for
/// large attempt counts.
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// How many times a stage runs and how long to wait between attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per stage, minimum 1 (1 means no retry).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows failure number `attempt`
    /// (1-based): base, 2x base, 4x base, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        let factor = 2u32.saturating_pow(exponent);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            ..Self::default()
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or the policy's
/// attempts are exhausted. Waits `delay_for_attempt` between tries.
pub async fn with_retries<T, F, Fut>(policy: &RetryPolicy, what: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < attempts => {
                let delay = policy.delay_for_attempt(attempt);
                warn!(
                    what,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrying after upstream failure"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use docdraft_shared::DocDraftError;

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(8),
        }
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(450),
        };
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_millis(450));
        assert_eq!(policy.delay_for_attempt(40), Duration::from_millis(450));
    }

    #[test]
    fn policy_from_config_enforces_at_least_one_attempt() {
        let config = RetryConfig {
            max_attempts: 0,
            base_delay_ms: 250,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
    }

    #[tokio::test]
    async fn upstream_failures_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = with_retries(&quick_policy(3), "flaky stage", || {
            let call = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if call < 2 {
                    Err(DocDraftError::upstream("transient"))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retries(&quick_policy(5), "lookup", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DocDraftError::not_found("missing branch")) }
        })
        .await;

        assert!(matches!(result, Err(DocDraftError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausting_attempts_surfaces_the_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retries(&quick_policy(3), "doomed stage", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DocDraftError::upstream("still down")) }
        })
        .await;

        assert!(matches!(result, Err(DocDraftError::Upstream(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_attempt_policy_never_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retries(&RetryPolicy::default(), "one shot", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(DocDraftError::upstream("down")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
