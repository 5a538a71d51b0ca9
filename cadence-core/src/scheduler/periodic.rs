//! Drift-free periodic deadline

#[cfg(feature = "defmt")]
use defmt::Format;

/// Absolute deadline advanced by a fixed interval
///
/// Each due poll moves the deadline forward by exactly one interval from
/// the *previous* deadline, never from "now", so the n-th firing happens
/// at `start + n * interval` no matter how late individual visits are.
/// There is no catch-up: after a long stall the deadline lags behind and
/// every following poll fires until it has caught up one interval at a
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct Periodic {
    interval_us: u64,
    next_us: u64,
}

impl Periodic {
    /// First deadline at `start_us + interval_us`
    pub const fn new(interval_us: u64, start_us: u64) -> Self {
        Self {
            interval_us,
            next_us: start_us.saturating_add(interval_us),
        }
    }

    /// Check the deadline; when due, advance it and return `true`
    pub fn poll(&mut self, now_us: u64) -> bool {
        if now_us < self.next_us {
            return false;
        }
        self.next_us = self.next_us.saturating_add(self.interval_us);
        true
    }

    /// Next deadline
    pub const fn next_us(&self) -> u64 {
        self.next_us
    }

    /// Interval between deadlines
    pub const fn interval_us(&self) -> u64 {
        self.interval_us
    }

    /// Change the interval; takes effect after the pending deadline
    pub fn set_interval(&mut self, interval_us: u64) {
        self.interval_us = interval_us;
    }

    /// Restart so that the next deadline is `now_us + interval_us`
    pub fn restart(&mut self, now_us: u64) {
        self.next_us = now_us.saturating_add(self.interval_us);
    }

    /// How far `now_us` is past the pending deadline (0 if not due)
    pub const fn lag_us(&self, now_us: u64) -> u64 {
        now_us.saturating_sub(self.next_us)
    }
}
