use std::{
    fmt::Debug,
    sync::atomic::{AtomicU64, Ordering},
};

use tokio::time::Instant;

/// A monotonic nanosecond time source.
///
/// Nothing in this workspace synchronizes the clock (that is gPTP's job); implementations only
/// need to be monotonic. The epoch is arbitrary but fixed for the lifetime of the clock.
pub trait Clock: Debug + Send + Sync + 'static {
    /// Returns the current time in nanoseconds since the clock's epoch.
    fn now_ns(&self) -> u64;
}

/// The default clock, backed by [`tokio::time::Instant`].
///
/// Because it reads Tokio's clock, pausing time in a test runtime (`start_paused = true`) also
/// pauses this clock, which keeps timer driven code deterministic under test.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        // u64 nanoseconds cover ~584 years of uptime.
        self.origin.elapsed().as_nanos() as u64
    }
}

/// A clock that only moves when told to. Used in tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_ns: u64) -> Self {
        Self { now: AtomicU64::new(start_ns) }
    }

    /// Sets the current time. Moving backwards is ignored to keep the clock monotonic.
    pub fn set(&self, now_ns: u64) {
        self.now.fetch_max(now_ns, Ordering::AcqRel);
    }

    /// Advances the clock by `delta_ns` and returns the new time.
    pub fn advance(&self, delta_ns: u64) -> u64 {
        self.now.fetch_add(delta_ns, Ordering::AcqRel) + delta_ns
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}
