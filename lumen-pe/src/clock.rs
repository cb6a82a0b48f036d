//! Time source for the engine
//!
//! Exam attempts and cooldowns are measured in whole epoch seconds. The
//! engine reads time through [`Clock`] so tests can pin it.

use std::sync::atomic::{AtomicI64, Ordering};

pub trait Clock: Send + Sync {
    /// Current time in seconds since the Unix epoch
    fn now_epoch_seconds(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> i64 {
        lumen_common::time::now_epoch_seconds()
    }
}

/// Manually driven clock for tests and simulations
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_epoch_seconds: i64) -> Self {
        Self {
            now: AtomicI64::new(start_epoch_seconds),
        }
    }

    pub fn set(&self, epoch_seconds: i64) {
        self.now.store(epoch_seconds, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_epoch_seconds(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(1_000);
        assert_eq!(clock.now_epoch_seconds(), 1_000);
        clock.advance(86_400);
        assert_eq!(clock.now_epoch_seconds(), 87_400);
        clock.set(5);
        assert_eq!(clock.now_epoch_seconds(), 5);
    }

    #[test]
    fn test_system_clock_is_recent() {
        assert!(SystemClock.now_epoch_seconds() > 946_684_800);
    }
}
