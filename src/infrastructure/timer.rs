use crate::types::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_DELAY};
use std::time::Duration;

/// Reconnect attempt counter with capped exponential backoff
#[derive(Debug, Clone)]
pub struct Timer {
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl Timer {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Attempts scheduled since the last reset
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// Count one more attempt and return how long to wait before it.
    ///
    /// Attempt `n` waits `base_delay * 2^(n-1)`. Returns `None` once the
    /// maximum is reached; the counter then stays put until [`reset`](Self::reset).
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        self.attempts += 1;
        let factor = 2u32.saturating_pow(self.attempts - 1);
        Some(self.base_delay.saturating_mul(factor))
    }

    /// Reset the timer
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(DEFAULT_RECONNECT_DELAY),
            DEFAULT_MAX_RECONNECT_ATTEMPTS,
        )
    }
}
