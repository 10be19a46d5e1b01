//! Adaptive delay counter
//!
//! One counter per dispatcher, shared by every accepted event:
//!
//! ```text
//! value' = value + step   if value <= ceiling
//!        = floor          otherwise
//! ```
//!
//! Starts at `floor`. Each accepted event advances it once and uses the
//! advanced value as its delay, so the observed delays form a sawtooth
//! `floor+step, floor+2*step, ..., then floor`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::DelayConfig;

/// Shared sawtooth delay state
#[derive(Debug)]
pub struct DelayCounter {
    config: DelayConfig,
    value_ms: AtomicU64,
}

impl DelayCounter {
    pub fn new(config: DelayConfig) -> Self {
        Self {
            value_ms: AtomicU64::new(config.floor_ms),
            config,
        }
    }

    pub fn config(&self) -> &DelayConfig {
        &self.config
    }

    /// Current value without advancing
    pub fn current_ms(&self) -> u64 {
        self.value_ms.load(Ordering::SeqCst)
    }

    /// Advance once and return the new value
    ///
    /// The read-modify-write is a single atomic update, so concurrent
    /// callers each observe a distinct step.
    pub fn advance(&self) -> u64 {
        let previous = self
            .value_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| {
                Some(next_value(&self.config, v))
            })
            .unwrap_or_else(|v| v);
        next_value(&self.config, previous)
    }

    /// Advance once and return the new value as a `Duration`
    pub fn advance_duration(&self) -> Duration {
        Duration::from_millis(self.advance())
    }
}

/// Pure transition function
pub fn next_value(config: &DelayConfig, value: u64) -> u64 {
    if value <= config.ceiling_ms {
        value.saturating_add(config.step_ms)
    } else {
        config.floor_ms
    }
}
