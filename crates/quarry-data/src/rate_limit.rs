//! Rate limiting for EDGAR requests.
//!
//! The SEC fair-access policy allows at most 10 requests per second. A single
//! process-wide limiter spaces outbound requests so the bound holds across
//! any 1-second window, however many tasks are fetching concurrently.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Process-wide request rate limiter.
///
/// Admissions are spaced at least `1/rate` seconds apart, which makes the
/// per-second upper bound hold for any window regardless of burst shape.
/// `acquire` suspends the caller until its slot arrives; cancellation drops
/// the wait without consuming a slot.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<Gate>>,
    min_interval: Duration,
}

#[derive(Debug)]
struct Gate {
    last_admission: Instant,
}

impl RateLimiter {
    /// Creates a limiter admitting at most `per_second` requests per second.
    pub fn new(per_second: u32) -> Self {
        let min_interval = Duration::from_micros(1_000_000 / u64::from(per_second.max(1)));
        Self {
            inner: Arc::new(Mutex::new(Gate {
                last_admission: Instant::now() - min_interval,
            })),
            min_interval,
        }
    }

    /// Waits until a request slot is available, then claims it.
    pub async fn acquire(&self) {
        let mut gate = self.inner.lock().await;
        let elapsed = gate.last_admission.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        gate.last_admission = Instant::now();
    }

    /// Minimum spacing between admissions.
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_acquire_is_immediate() {
        let limiter = RateLimiter::new(10);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_acquisitions_are_spaced() {
        let limiter = RateLimiter::new(10);
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire().await;
        }
        // 3 intervals of 100ms between 4 admissions
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_upper_bound_holds_under_concurrency() {
        let limiter = RateLimiter::new(10);
        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..12 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }
        let mut times = Vec::new();
        for handle in handles {
            times.push(handle.await.unwrap());
        }
        times.sort();
        // 12 admissions at 10/s need at least 1.1s from the first slot
        assert!(times[11].duration_since(start) >= Duration::from_millis(1_100));
        // Any 11 consecutive admissions span more than a second
        assert!(times[11].duration_since(times[0]) > Duration::from_secs(1));
    }

    #[test]
    fn test_min_interval() {
        assert_eq!(
            RateLimiter::new(10).min_interval(),
            Duration::from_millis(100)
        );
    }
}
