//! Fixed-delay retry policy
//!
//! The kiosk has nothing useful to do while the directory or the live channel
//! is unreachable, so the retry loops that use this policy never give up. The
//! delay is injected so tests do not block for real seconds.

use std::time::Duration;

/// Delay between attempts of an unbounded retry loop
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    pub fn fixed(delay: Duration) -> Self {
        Self { delay }
    }

    /// No delay between attempts; only yields to the scheduler
    pub fn immediate() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait before the next attempt
    pub async fn wait(&self) {
        if self.delay.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(DEFAULT_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_second() {
        assert_eq!(RetryPolicy::default().delay(), Duration::from_secs(1));
    }

    #[tokio::test]
    async fn immediate_does_not_sleep() {
        let start = std::time::Instant::now();
        for _ in 0..100 {
            RetryPolicy::immediate().wait().await;
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
