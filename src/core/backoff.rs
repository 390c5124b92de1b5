use std::{fmt::Display, future::Future, time::Duration};

/// Exponential backoff settings for rate limited calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Total number of attempts, including the first one
    pub max_retries: u32,
    /// Delay before the first retry, doubled for every following one
    pub base_delay: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(base_delay_ms),
        }
    }

    /// Delay after the failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl Default for BackoffPolicy {
    /// 3 attempts, 2s base delay
    fn default() -> Self {
        Self::new(3, 2000)
    }
}

/// Whether a failure message is the search service throttling us.
pub fn is_rate_limited(message: &str) -> bool {
    message.contains("429") || message.contains("Too Many Requests")
}

/// Runs `operation`, re-running it with exponential delay while it fails with
/// a rate limit error. Any other error is returned right away.
///
/// Attempts never overlap. Once `policy.max_retries` attempts have failed the
/// last error is returned without a trailing sleep. A budget of zero still runs
/// the operation once.
pub async fn execute_with_backoff<T, E, F, Fut>(
    mut operation: F,
    policy: &BackoffPolicy,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_retries.max(1);
    let mut attempt: u32 = 0;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let message = err.to_string();
        if !is_rate_limited(&message) {
            return Err(err);
        }

        if attempt + 1 >= max_attempts {
            log::warn!(
                "Rate limited, giving up after {} attempts: {}",
                max_attempts,
                message
            );
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        log::warn!(
            "Rate limited, retrying in {}ms (attempt {}/{})",
            delay.as_millis(),
            attempt + 1,
            max_attempts
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
