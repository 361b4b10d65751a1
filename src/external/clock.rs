//! Time Source
//!
//! The engine reads time once per call, through this trait.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::UnixSeconds;

/// Current unix time.
pub trait Clock: Send + Sync {
    /// Seconds since the unix epoch.
    fn now(&self) -> UnixSeconds;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UnixSeconds {
        chrono::Utc::now().timestamp().max(0) as UnixSeconds
    }
}

/// Settable clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Clock frozen at `now`.
    pub fn new(now: UnixSeconds) -> Self {
        Self { now: AtomicU64::new(now) }
    }

    /// Jump to a time.
    pub fn set(&self, now: UnixSeconds) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward.
    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> UnixSeconds {
        self.now.load(Ordering::SeqCst)
    }
}
