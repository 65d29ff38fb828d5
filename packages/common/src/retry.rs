use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::Deserialize;
use tracing::warn;

/// Bounded retry with exponential backoff, used around "acquire a unit of
/// work" on the metadata store.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one. Default: 2.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u8,
    /// Delay before the second attempt. Default: 200 ms.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound for any single delay. Default: 2000 ms.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u8 {
    2
}
fn default_base_delay_ms() -> u64 {
    200
}
fn default_max_delay_ms() -> u64 {
    2000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Exhausted,
}

/// Returned once every attempt has failed.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u8,
    pub last_error: E,
}

impl RetryPolicy {
    /// Decide whether the `attempt`-th failure (1-based) gets another try.
    pub fn decide(&self, attempt: u8) -> RetryDecision {
        if attempt < self.max_attempts.max(1) {
            RetryDecision::Retry {
                delay: calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms),
            }
        } else {
            RetryDecision::Exhausted
        }
    }

    /// Run `op` until it succeeds, `is_retryable` rejects its error, or the
    /// attempt budget is spent.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation: &str,
        is_retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt: u8 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) => {
                    return Err(RetryExhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => match self.decide(attempt) {
                    RetryDecision::Retry { delay } => {
                        warn!(
                            operation,
                            attempt,
                            max_attempts = self.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Attempt failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    RetryDecision::Exhausted => {
                        warn!(operation, attempt, error = %e, "Retries exhausted");
                        return Err(RetryExhausted {
                            attempts: attempt,
                            last_error: e,
                        });
                    }
                },
            }
        }
    }
}

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(base_ms * 2^(attempt-1) + jitter, max_ms)` (0-25% jitter)
pub fn calculate_backoff(attempt: u8, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow((attempt - 1) as u32);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    let total_delay = delay_ms.saturating_add(jitter).min(max_ms);
    Duration::from_millis(total_delay)
}
