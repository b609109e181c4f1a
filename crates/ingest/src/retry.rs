use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff with full jitter for calls to external services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Upper bound of the sleep before attempt `attempt + 1`.
    pub fn backoff_ceiling(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Runs `operation` until it succeeds or attempts are exhausted, returning
    /// the last error.
    pub async fn run<T, E, F, Fut>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => return Err(e),
                Err(e) => {
                    let ceiling = self.backoff_ceiling(attempt);
                    let delay = rand::thread_rng().gen_range(Duration::ZERO..=ceiling);
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
