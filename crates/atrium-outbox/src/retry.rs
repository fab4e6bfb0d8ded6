//! Retry policy for failed deliveries.

use std::time::Duration;

/// Exponential backoff with a cap, plus the attempt count past which a row
/// is considered stuck and alerted on.
///
/// A stuck row is never dropped — ordering within its domain would be lost —
/// it just escalates from warn to error logging so an operator can step in.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Backoff multiplier per additional attempt.
    pub multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Attempts after which the dispatcher logs at error level.
    pub stuck_threshold: i32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(2),
            multiplier: 2.0,
            max_delay: Duration::from_secs(300),
            stuck_threshold: 10,
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempts + 1`, given `attempts` failures so far
    /// (1-indexed: pass 1 after the first failure).
    pub fn next_delay(&self, attempts: i32) -> Duration {
        let exponent = attempts.saturating_sub(1).max(0);
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::from_secs_f64(secs.min(self.max_delay.as_secs_f64()))
    }

    /// Immediate retries, used by tests that drive the dispatcher manually.
    pub fn immediate() -> Self {
        Self {
            base_delay: Duration::ZERO,
            multiplier: 1.0,
            max_delay: Duration::ZERO,
            stuck_threshold: 10,
        }
    }
}
