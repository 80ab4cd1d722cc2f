//! Retry delay after a failed work cycle
//!
//! The delay doubles with every consecutive failure starting from `base`,
//! stops growing at `max`, and gets up to `jitter` of random slack added so
//! a fleet of workers does not retry in lockstep.

use rand::Rng;
use std::time::Duration;

/// Default first retry delay in seconds.
pub const DEFAULT_BACKOFF_BASE_SECS: u64 = 30;

/// Default ceiling of the retry delay in seconds.
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Default random slack added to every delay in seconds.
pub const DEFAULT_BACKOFF_JITTER_SECS: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffConfig {
    pub base: Duration,
    pub max: Duration,
    pub jitter: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(DEFAULT_BACKOFF_BASE_SECS),
            max: Duration::from_secs(DEFAULT_BACKOFF_MAX_SECS),
            jitter: Duration::from_secs(DEFAULT_BACKOFF_JITTER_SECS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    failures: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            failures: 0,
        }
    }

    /// Consecutive failures since the last reset
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Delay for the next retry without jitter
    pub fn current_delay(&self) -> Duration {
        let factor = 1u32.checked_shl(self.failures).unwrap_or(u32::MAX);
        self.config
            .base
            .checked_mul(factor)
            .unwrap_or(self.config.max)
            .min(self.config.max)
    }

    /// Record a failure and return how long to wait before retrying
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current_delay() + self.jitter();
        self.failures = self.failures.saturating_add(1);
        delay
    }

    /// Forget past failures after a successful cycle
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    fn jitter(&self) -> Duration {
        let max_ms = u64::try_from(self.config.jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }
}
