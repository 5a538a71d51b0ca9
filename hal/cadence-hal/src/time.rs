//! Monotonic time and delays
//!
//! [`Clock`] is what background tasks compare their deadlines against.
//! Delays use the `embedded-hal` [`DelayNs`] trait so the bus engine can
//! be handed a real busy-wait on target and a virtual delay in tests.

pub use embedded_hal::delay::DelayNs;

/// Monotonic microsecond clock
pub trait Clock {
    /// Microseconds since an arbitrary epoch; never decreases
    fn now_us(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_us(&self) -> u64 {
        (**self).now_us()
    }
}

/// Delay that spins on a [`Clock`]
///
/// Resolution is one microsecond; shorter waits round up. Only meant for
/// the lowest bus layer, never for task bodies.
#[derive(Debug, Clone)]
pub struct BusyDelay<C> {
    clock: C,
}

impl<C: Clock> BusyDelay<C> {
    /// Create a delay on top of a clock
    pub const fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Access the clock
    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn spin_us(&mut self, us: u64) {
        let start = self.clock.now_us();
        while self.clock.now_us().wrapping_sub(start) < us {
            core::hint::spin_loop();
        }
    }
}

impl<C: Clock> DelayNs for BusyDelay<C> {
    fn delay_ns(&mut self, ns: u32) {
        self.spin_us(u64::from(ns).div_ceil(1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.spin_us(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.spin_us(u64::from(ms) * 1000);
    }
}
