//! Retry policy with exponential backoff

use crate::config::schema::ApiConfig;
use std::time::Duration;

/// How hard the client tries before giving up.
///
/// Delays grow by `backoff_multiplier` after every retry. There is no
/// jitter and no cap.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Upper bound for a single attempt
    pub timeout_per_attempt: Duration,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Factor applied to the delay after every retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            timeout_per_attempt: Duration::from_secs(15),
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn from_config(api: &ApiConfig) -> Self {
        Self {
            max_attempts: api.max_attempts,
            timeout_per_attempt: api.timeout(),
            initial_delay: api.initial_delay(),
            backoff_multiplier: api.backoff_multiplier,
        }
    }

    /// Attempts actually made; a zero setting still makes one attempt
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the `retry`-th failure (0-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let multiplier = if self.backoff_multiplier.is_finite() {
            self.backoff_multiplier.max(0.0)
        } else {
            1.0
        };
        let factor = multiplier.powi(retry.min(i32::MAX as u32) as i32);
        Duration::try_from_secs_f64(self.initial_delay.as_secs_f64() * factor)
            .unwrap_or(Duration::MAX)
    }

    /// Every inter-attempt delay, in order
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.attempts() - 1).map(|retry| self.delay_for(retry))
    }
}
