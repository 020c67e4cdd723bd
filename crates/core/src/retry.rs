//! Exponential backoff retry utility
//!
//! Used at startup to wait out cold Redis, Elasticsearch and Postgres
//! connections. Delays grow as `base * 2^attempt` capped at a maximum, with
//! optional jitter so several services restarting together do not reconnect
//! in lockstep.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry policy configuration for exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the initial one.
    pub max_retries: u32,
    /// Base delay in milliseconds for the first retry.
    pub base_delay_ms: u64,
    /// Cap on the exponential growth, in milliseconds.
    pub max_delay_ms: u64,
    /// Whether to add random jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 5000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64, max_delay_ms: u64, jitter: bool) -> Self {
        Self {
            max_retries,
            base_delay_ms,
            max_delay_ms,
            jitter,
        }
    }

    /// Policy for connecting to collaborators at process start.
    ///
    /// Patient enough to ride out a container orchestrator bringing the
    /// stores up in parallel; exhausting it is fatal for the process.
    pub fn startup() -> Self {
        Self {
            max_retries: 8,
            base_delay_ms: 500,
            max_delay_ms: 30_000,
            jitter: true,
        }
    }

    fn calculate_delay(&self, attempt: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2_u64.saturating_pow(attempt));
        let capped = exponential.min(self.max_delay_ms);

        let final_delay = if self.jitter {
            let jitter_range = (capped as f64 * 0.3) as u64;
            if jitter_range > 0 {
                capped.saturating_add(rand::thread_rng().gen_range(0..=jitter_range))
            } else {
                capped
            }
        } else {
            capped
        };

        Duration::from_millis(final_delay)
    }
}

/// Retries an async operation with exponential backoff.
///
/// The operation is re-executed until it succeeds, the policy's attempts are
/// exhausted, or `is_retryable` returns false for the error.
pub async fn retry_with_backoff<F, Fut, T, E, P>(
    mut operation: F,
    policy: RetryPolicy,
    is_retryable: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => {
                tracing::debug!(attempt = attempt, "Operation succeeded");
                return Ok(result);
            }
            Err(error) => {
                if attempt >= policy.max_retries {
                    tracing::warn!(
                        attempt = attempt,
                        max_retries = policy.max_retries,
                        "All retry attempts exhausted"
                    );
                    return Err(error);
                }

                if !is_retryable(&error) {
                    tracing::debug!(attempt = attempt, "Error is not retryable");
                    return Err(error);
                }

                let delay = policy.calculate_delay(attempt);
                tracing::debug!(
                    attempt = attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after delay"
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn delay_grows_exponentially_without_jitter() {
        let policy = RetryPolicy::new(5, 100, 10_000, false);
        assert_eq!(policy.calculate_delay(0).as_millis(), 100);
        assert_eq!(policy.calculate_delay(1).as_millis(), 200);
        assert_eq!(policy.calculate_delay(2).as_millis(), 400);
        assert_eq!(policy.calculate_delay(3).as_millis(), 800);
    }

    #[test]
    fn delay_is_capped_at_max() {
        let policy = RetryPolicy::new(10, 100, 500, false);
        assert_eq!(policy.calculate_delay(5).as_millis(), 500);
        assert_eq!(policy.calculate_delay(10).as_millis(), 500);
    }

    #[test]
    fn jitter_stays_within_thirty_percent() {
        let policy = RetryPolicy::new(3, 1000, 5000, true);
        for _ in 0..20 {
            let delay_ms = policy.calculate_delay(0).as_millis();
            assert!(delay_ms >= 1000);
            assert!(delay_ms <= 1300);
        }
    }

    #[tokio::test]
    async fn succeeds_immediately_without_retrying() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_backoff(
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, String>("connected")
                }
            },
            RetryPolicy::default(),
            |_: &String| true,
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_backoff(
            || {
                let c = c.clone();
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err("connection refused")
                    } else {
                        Ok("connected")
                    }
                }
            },
            RetryPolicy::new(5, 10, 100, false),
            |_: &&str| true,
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_attempts_and_returns_last_error() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_backoff(
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("still down")
                }
            },
            RetryPolicy::new(3, 10, 100, false),
            |_: &&str| true,
        )
        .await;

        assert_eq!(result.unwrap_err(), "still down");
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn non_retryable_error_fails_immediately() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();

        let result = retry_with_backoff(
            || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>("bad credentials")
                }
            },
            RetryPolicy::default(),
            |err: &&str| *err != "bad credentials",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
