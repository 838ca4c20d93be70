//! Bounded retry policy and injectable time source.
//!
//! Every poll in the harness (node startup, transaction propagation,
//! block-height sync) runs under a [`RetryPolicy`] driven through a
//! [`Clock`], so tests can exhaust a poll without real delay.

use std::{
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;

/// Default interval between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A bounded polling schedule: at most `max_attempts` checks separated by
/// `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts before the poll gives up.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub interval: Duration,
}

impl RetryPolicy {
    /// A policy with an explicit attempt budget.
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    /// A policy that covers `total` wall time at the given interval.
    ///
    /// Always allows at least one attempt, even for a zero total.
    pub fn deadline(total: Duration, interval: Duration) -> Self {
        let interval = if interval.is_zero() { DEFAULT_POLL_INTERVAL } else { interval };
        let attempts = total.as_millis().div_ceil(interval.as_millis().max(1)).max(1);
        Self { max_attempts: attempts.min(u128::from(u32::MAX)) as u32, interval }
    }
}

/// Time source for polling loops.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Sleep for the given duration.
    async fn sleep(&self, duration: Duration);
}

/// Real time via the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// A clock that returns immediately and records every requested sleep.
///
/// Lets tests drive a poll to exhaustion without waiting.
#[derive(Debug, Default)]
pub struct InstantClock {
    slept: Mutex<Vec<Duration>>,
}

impl InstantClock {
    /// Create a new recording clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total virtual time slept so far.
    pub fn total_slept(&self) -> Duration {
        self.slept.lock().expect("clock lock poisoned").iter().sum()
    }

    /// Number of sleeps requested so far.
    pub fn sleep_count(&self) -> usize {
        self.slept.lock().expect("clock lock poisoned").len()
    }
}

#[async_trait]
impl Clock for InstantClock {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().expect("clock lock poisoned").push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_covers_total_wait() {
        let policy = RetryPolicy::deadline(Duration::from_secs(90), Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 90);
        assert_eq!(policy.interval, Duration::from_secs(1));
    }

    #[test]
    fn test_deadline_rounds_up() {
        let policy = RetryPolicy::deadline(Duration::from_millis(2500), Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 3);
    }

    #[test]
    fn test_deadline_always_allows_one_attempt() {
        let policy = RetryPolicy::deadline(Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_deadline_zero_interval_falls_back() {
        let policy = RetryPolicy::deadline(Duration::from_secs(10), Duration::ZERO);
        assert_eq!(policy.interval, DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test]
    async fn test_instant_clock_records_sleeps() {
        let clock = InstantClock::new();
        clock.sleep(Duration::from_secs(2)).await;
        clock.sleep(Duration::from_secs(3)).await;
        assert_eq!(clock.sleep_count(), 2);
        assert_eq!(clock.total_slept(), Duration::from_secs(5));
    }
}
