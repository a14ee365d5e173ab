//! Randomised pause between chapter fetches.

use std::time::Duration;

use rand::Rng;

use crate::config::DownloadConfig;

/// Sleeps a uniformly random time inside a fixed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    min: Duration,
    max: Duration,
}

impl Pacer {
    /// Pacer sampling from `min..=max`; the bounds are swapped if reversed.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    /// Pacer that never sleeps.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Pacer using the configured delay range.
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(
            Duration::from_millis(config.delay_min_ms),
            Duration::from_millis(config.delay_max_ms),
        )
    }

    /// Whether [`pause`](Self::pause) can sleep at all.
    pub fn is_enabled(&self) -> bool {
        !self.max.is_zero()
    }

    /// Draw the next delay.
    pub fn next_delay(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let min = self.min.as_millis() as u64;
        let max = self.max.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    /// Sleep for a freshly drawn delay.
    pub fn pause(&self) {
        if !self.is_enabled() {
            return;
        }
        let delay = self.next_delay();
        log::trace!("Pausing {:?} before next chapter", delay);
        std::thread::sleep(delay);
    }
}
