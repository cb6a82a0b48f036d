//! Pending-cascade barrier
//!
//! While a chapter-completion cascade is in flight, readers that paint the
//! exam icon must not see an exam that is `Locked` now but `Unlocked` a
//! moment later. Cascades hold a [`CascadeGuard`] for their whole duration;
//! cascade-dependent readers call [`CascadeBarrier::wait_clear`] first.
//!
//! The barrier counts in-flight cascades in a `watch` channel, so readers
//! sleep until the count drops to zero instead of polling, and two
//! overlapping cascades cannot release readers early.

use tokio::sync::watch;

/// Counter of in-flight cascades owned by one engine instance
#[derive(Debug)]
pub struct CascadeBarrier {
    in_flight: watch::Sender<usize>,
}

impl CascadeBarrier {
    pub fn new() -> Self {
        let (in_flight, _) = watch::channel(0);
        Self { in_flight }
    }

    /// Mark a cascade as in flight until the returned guard is dropped
    pub fn enter(&self) -> CascadeGuard<'_> {
        self.in_flight.send_modify(|count| *count += 1);
        CascadeGuard { barrier: self }
    }

    /// Number of cascades currently in flight
    pub fn in_flight(&self) -> usize {
        *self.in_flight.borrow()
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight() > 0
    }

    /// Wait until no cascade is in flight
    ///
    /// Returns immediately when the barrier is clear.
    pub async fn wait_clear(&self) {
        let mut rx = self.in_flight.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait
        let _ = rx.wait_for(|count| *count == 0).await;
    }
}

impl Default for CascadeBarrier {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps a cascade registered; clears it on drop, including on error paths
#[derive(Debug)]
pub struct CascadeGuard<'a> {
    barrier: &'a CascadeBarrier,
}

impl Drop for CascadeGuard<'_> {
    fn drop(&mut self) {
        self.barrier
            .in_flight
            .send_modify(|count| *count = count.saturating_sub(1));
    }
}
