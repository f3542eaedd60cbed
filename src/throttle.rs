//! Fixed-interval request pacing.
//!
//! A [`Throttle`] guarantees at least `interval` (plus optional random jitter)
//! between the starts of successive calls. It is owned by whichever component
//! makes repeated external calls, and uses tokio's clock so tests can run it
//! under `tokio::time::pause`.

use std::time::Duration;
use tokio::time::Instant;
use tracing::trace;

/// Minimum-interval pacer for repeated external calls.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    jitter: Duration,
    last: Option<Instant>,
}

impl Throttle {
    /// Throttle with a fixed minimum interval between calls.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            jitter: Duration::ZERO,
            last: None,
        }
    }

    /// Throttle that never waits.
    pub fn disabled() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Add up to `jitter` of random extra delay to each wait.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Wait until the next call is allowed, then mark it as started.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let deadline = last + self.interval + self.sample_jitter();
            if deadline > Instant::now() {
                trace!(wait_ms = (deadline - Instant::now()).as_millis() as u64, "Throttling");
                tokio::time::sleep_until(deadline).await;
            }
        }
        self.last = Some(Instant::now());
    }

    fn sample_jitter(&self) -> Duration {
        let max = self.jitter.as_millis() as u64;
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::random::<u64>() % (max + 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_call_is_immediate() {
        let mut throttle = Throttle::fixed(Duration::from_millis(400));
        let start = Instant::now();
        throttle.wait().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaces_successive_calls() {
        let mut throttle = Throttle::fixed(Duration::from_millis(400));
        let start = Instant::now();
        for _ in 0..3 {
            throttle.wait().await;
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(800), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(850), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_work_is_not_penalized() {
        let mut throttle = Throttle::fixed(Duration::from_millis(200));
        throttle.wait().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        let before = Instant::now();
        throttle.wait().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_is_bounded() {
        let mut throttle =
            Throttle::fixed(Duration::from_millis(100)).with_jitter(Duration::from_millis(50));
        throttle.wait().await;
        let before = Instant::now();
        throttle.wait().await;
        let elapsed = before.elapsed();
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed <= Duration::from_millis(160));
    }

    #[tokio::test]
    async fn test_disabled_never_sleeps() {
        let mut throttle = Throttle::disabled();
        let start = std::time::Instant::now();
        for _ in 0..100 {
            throttle.wait().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
