//! Exponential backoff with jitter for failed delivery attempts.
//!
//! Delays grow by doubling from a base, are capped, and carry symmetric
//! randomized jitter so many subscriptions failing at once do not retry in
//! lockstep.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Retry policy for webhook delivery.
///
/// `max_retries` counts retries after the initial attempt, so a policy of
/// 3 allows at most 4 outbound requests per delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum retries after the first attempt.
    pub max_retries: u32,

    /// Base delay for the exponential backoff calculation.
    pub base_delay: Duration,

    /// Cap on any single backoff delay (before jitter).
    pub max_delay: Duration,

    /// Jitter fraction (0.0 to 1.0) applied symmetrically around the
    /// capped delay.
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            jitter_factor: 0.25, // ±25% randomization
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry with the given zero-based index.
    ///
    /// `attempt_index` 0 is the first retry (after the initial attempt has
    /// failed). The exponential delay is capped at `max_delay`, then
    /// jittered by ±`jitter_factor`; the result is rounded to whole
    /// milliseconds and never negative.
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let multiplier = 2_u32.saturating_pow(attempt_index.min(20));
        let exponential = self.base_delay.saturating_mul(multiplier);
        let capped = exponential.min(self.max_delay);

        apply_jitter(capped, self.jitter_factor)
    }

    /// Total attempts this policy allows (initial attempt plus retries).
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Applies symmetric jitter to a delay.
///
/// With `jitter_factor` 0.25, a 10s delay becomes 7.5s to 12.5s at random.
fn apply_jitter(delay: Duration, jitter_factor: f64) -> Duration {
    if jitter_factor <= 0.0 {
        return delay;
    }

    let clamped = jitter_factor.clamp(0.0, 1.0);
    let delay_ms = delay.as_secs_f64() * 1000.0;

    let mut rng = rand::rng();
    let offset = delay_ms * clamped * rng.random_range(-1.0..=1.0);
    let jittered_ms = (delay_ms + offset).round().max(0.0);

    Duration::from_millis(jittered_ms as u64)
}
