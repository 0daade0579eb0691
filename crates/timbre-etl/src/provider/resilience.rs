//! Resilience primitives for provider clients.

use std::sync::Arc;

use backon::ExponentialBuilder;
use tokio::sync::Semaphore;
use tokio::time::{sleep, Duration};

/// Per-client rate limiter using a token-bucket approach.
///
/// Limits throughput to a configurable number of requests per second by
/// combining a single-permit [`Semaphore`] with a fixed sleep interval.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
    interval: Duration,
}

impl RateLimiter {
    /// Creates a new `RateLimiter` that allows at most
    /// `requests_per_second` requests per second. Zero is treated as one.
    pub fn new(requests_per_second: u32) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
            interval: Duration::from_millis(1000 / u64::from(requests_per_second.max(1))),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a request slot is available, then holds the slot for
    /// the configured interval to enforce the rate limit.
    pub async fn acquire(&self) {
        // The semaphore is never closed; if it were, pacing is skipped.
        let Ok(_permit) = self.semaphore.acquire().await else {
            return;
        };
        sleep(self.interval).await;
    }
}

/// Exponential backoff used for transient provider failures.
pub fn retry_policy(max_retries: usize) -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(500))
        .with_max_delay(Duration::from_secs(10))
        .with_max_times(max_retries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_from_rate() {
        assert_eq!(RateLimiter::new(5).interval(), Duration::from_millis(200));
        assert_eq!(RateLimiter::new(0).interval(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_acquire_waits_for_interval() {
        let limiter = RateLimiter::new(100);
        let start = tokio::time::Instant::now();
        limiter.acquire().await;
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
