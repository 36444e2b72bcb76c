use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Reconnect backoff policy: exponential growth to a cap, with jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first reconnect attempt, in milliseconds.
    pub initial_delay_ms: u64,
    /// Upper bound on the delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Fraction of the delay randomized in each direction (0.0 disables
    /// jitter). Keeps a fleet of clients from redialing in lockstep after a
    /// server restart.
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: 2_000,
            max_delay_ms: 30_000,
            jitter: 0.2,
        }
    }
}

impl BackoffConfig {
    /// Delay before reconnect attempt `attempt` (1-based): doubles per
    /// attempt from `initial_delay_ms`, capped at `max_delay_ms`, then
    /// jittered.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base = self
            .initial_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_delay_ms);

        if self.jitter <= 0.0 {
            return Duration::from_millis(base);
        }

        let spread = self.jitter.min(1.0);
        let factor = 1.0 + rand::rng().random_range(-spread..=spread);
        Duration::from_millis((base as f64 * factor) as u64)
    }
}
