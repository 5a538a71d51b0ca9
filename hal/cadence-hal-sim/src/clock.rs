//! Virtual time

use std::cell::Cell;
use std::rc::Rc;

use cadence_hal::{Clock, DelayNs};

/// Manually advanced microsecond clock
///
/// Clones share the same time base.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Rc<Cell<u64>>,
}

impl SimClock {
    /// Clock starting at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute time
    ///
    /// Time never goes backwards; earlier values are ignored.
    pub fn set(&self, now_us: u64) {
        if now_us > self.now.get() {
            self.now.set(now_us);
        }
    }

    /// Move forward by `us`
    pub fn advance(&self, us: u64) {
        self.now.set(self.now.get() + us);
    }

    /// Current time
    pub fn now(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for SimClock {
    fn now_us(&self) -> u64 {
        self.now.get()
    }
}

/// Delay that advances a [`SimClock`] instead of waiting
///
/// Nanoseconds are accumulated so that many sub-microsecond waits still
/// add up to the right amount of virtual time.
#[derive(Debug, Clone)]
pub struct SimDelay {
    clock: SimClock,
    remainder_ns: u64,
    total_ns: u64,
    calls: u64,
}

impl SimDelay {
    /// Delay bound to `clock`
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            remainder_ns: 0,
            total_ns: 0,
            calls: 0,
        }
    }

    /// Total time waited so far in nanoseconds
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    /// Number of waits requested
    pub fn calls(&self) -> u64 {
        self.calls
    }

    /// The clock this delay advances
    pub fn clock(&self) -> &SimClock {
        &self.clock
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.calls += 1;
        self.total_ns += u64::from(ns);
        self.remainder_ns += u64::from(ns);
        self.clock.advance(self.remainder_ns / 1000);
        self.remainder_ns %= 1000;
    }
}
