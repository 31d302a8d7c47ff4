//! Kill-Signal Latch
//!
//! The hub owns a 1-slot `Shutdown` field and writes `SHUTDOWN_VALUE` to it
//! exactly once, as a forced record. Spokes poll it every iteration.
//!
//! ```text
//! [RUNNING] ──new record == 1.0──→ [SHUTDOWN]   (no way back)
//! ```

use crate::domain::buffer::RecvBuffer;
use std::time::{Duration, Instant};
use tracing::debug;

/// Payload the hub publishes to request termination.
pub const SHUTDOWN_VALUE: f64 = 1.0;

/// Poll gaps longer than this are logged; a spoke that stops polling hangs
/// the whole run.
pub const SLOW_POLL_THRESHOLD: Duration = Duration::from_secs(10);

/// One-directional record of whether shutdown has been observed.
#[derive(Debug)]
pub struct ShutdownLatch {
    observed: bool,
    last_check: Instant,
    checks: u64,
}

impl ShutdownLatch {
    pub fn new() -> Self {
        Self {
            observed: false,
            last_check: Instant::now(),
            checks: 0,
        }
    }

    /// Inspect the freshly fetched shutdown buffer.
    ///
    /// Only a newly accepted record can trip the latch; once tripped it
    /// stays tripped regardless of later fetches.
    pub fn observe(&mut self, buffer: &RecvBuffer) -> bool {
        let since_last = self.last_check.elapsed();
        self.last_check = Instant::now();
        self.checks += 1;
        if since_last > SLOW_POLL_THRESHOLD {
            debug!(
                gap_ms = since_last.as_millis() as u64,
                "Kill signal polled after a long gap"
            );
        }

        if !self.observed
            && buffer.is_new()
            && buffer.values().first().copied() == Some(SHUTDOWN_VALUE)
        {
            self.observed = true;
        }
        self.observed
    }

    pub fn is_set(&self) -> bool {
        self.observed
    }

    /// Number of polls so far.
    pub fn checks(&self) -> u64 {
        self.checks
    }
}

impl Default for ShutdownLatch {
    fn default() -> Self {
        Self::new()
    }
}
