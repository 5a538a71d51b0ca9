//! Blinking output

use cadence_core::{Periodic, Task};
use cadence_hal::PinOut;

/// Background task toggling a pin every interval
pub struct Blinker<P> {
    pin: P,
    periodic: Periodic,
    on: bool,
    toggles: u32,
}

impl<P: PinOut> Blinker<P> {
    /// Start with the pin off; the first toggle is due at
    /// `now_us + interval_us`
    pub fn new(mut pin: P, interval_us: u64, now_us: u64) -> Self {
        pin.write_flush(false);
        Self {
            pin,
            periodic: Periodic::new(interval_us, now_us),
            on: false,
            toggles: 0,
        }
    }

    /// Number of toggles so far
    pub fn toggles(&self) -> u32 {
        self.toggles
    }

    /// Current output level
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Give back the pin
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: PinOut> Task for Blinker<P> {
    fn work(&mut self, now_us: u64) {
        if !self.periodic.poll(now_us) {
            return;
        }
        self.on = !self.on;
        self.pin.write_flush(self.on);
        self.toggles = self.toggles.wrapping_add(1);
    }
}
