//! Monotonic wall-clock abstraction.
//!
//! The scheduler never calls `Instant::now()` directly so tests can drive
//! ticks against a virtual clock instead of sleeping in real time.

use std::time::Instant;

/// A source of monotonically non-decreasing wall-clock seconds.
pub trait Clock: Send + 'static {
    /// Seconds elapsed since some fixed, clock-specific epoch.
    fn now(&self) -> f64;
}

/// Real clock backed by `std::time::Instant`.
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// A clock whose time is advanced explicitly by the caller. Used in tests
/// and by hosts that drive the scheduler from their own clock (an audio
/// callback's frame counter, for instance) instead of a sleep loop.
pub struct ManualClock {
    now: std::sync::atomic::AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        ManualClock {
            now: std::sync::atomic::AtomicU64::new(start.to_bits()),
        }
    }

    pub fn set(&self, t: f64) {
        self.now.store(t.to_bits(), std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, dt: f64) {
        self.set(self.now() + dt);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.now.load(std::sync::atomic::Ordering::SeqCst))
    }
}
