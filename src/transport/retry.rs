use rand::Rng;
use std::time::Duration;

use crate::config::TransportConfig;

/// Attempt budget and backoff shape for one fetch.
///
/// The delay after failed attempt `n` (counted from 0) is `2^n` seconds plus a
/// uniform jitter in `[jitter_min, jitter_max)`. No delay follows the last attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub jitter_min: Duration,
    pub jitter_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            jitter_min: Duration::from_millis(500),
            jitter_max: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            jitter_min: Duration::from_millis(config.backoff_jitter_min_ms),
            jitter_max: Duration::from_millis(config.backoff_jitter_max_ms),
        }
    }

    /// Deterministic part of the delay after `attempt` failed.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        Duration::from_secs(1u64 << attempt.min(16))
    }

    /// Full delay after `attempt` failed, or `None` if no attempt remains.
    pub fn backoff<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Option<Duration> {
        if attempt + 1 >= self.max_attempts {
            return None;
        }
        Some(self.base_delay(attempt) + jitter(self.jitter_min, self.jitter_max, rng))
    }
}

/// Uniform duration in `[min, max)`; `min` when the range is empty.
pub fn jitter<R: Rng + ?Sized>(min: Duration, max: Duration, rng: &mut R) -> Duration {
    if max <= min {
        return min;
    }
    rng.gen_range(min..max)
}
