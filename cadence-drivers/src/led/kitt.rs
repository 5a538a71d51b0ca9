//! KITT scanner
//!
//! A single lit output walking back and forth across a port, one step
//! per interval: 0, 1, .., n-1, n-2, .., 0, 1, ..

use cadence_core::{Periodic, Task};
use cadence_hal::PortOut;

/// Background task sweeping one lit pin across a port
pub struct Kitt<P> {
    port: P,
    periodic: Periodic,
    position: u8,
    rising: bool,
}

impl<P: PortOut> Kitt<P> {
    /// Light pin 0 right away; the first step is due at
    /// `now_us + interval_us`
    pub fn new(port: P, interval_us: u64, now_us: u64) -> Self {
        let mut kitt = Self {
            port,
            periodic: Periodic::new(interval_us, now_us),
            position: 0,
            rising: true,
        };
        kitt.show();
        kitt
    }

    /// Currently lit pin
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Give back the port
    pub fn release(self) -> P {
        self.port
    }

    fn advance(&mut self) {
        let last = self.port.number_of_pins().saturating_sub(1);
        if last == 0 {
            return;
        }

        if self.rising && self.position >= last {
            self.rising = false;
        } else if !self.rising && self.position == 0 {
            self.rising = true;
        }

        if self.rising {
            self.position += 1;
        } else {
            self.position -= 1;
        }
    }

    fn show(&mut self) {
        self.port.write(1 << self.position);
        self.port.flush();
    }
}

impl<P: PortOut> Task for Kitt<P> {
    fn work(&mut self, now_us: u64) {
        if self.periodic.poll(now_us) {
            self.advance();
            self.show();
        }
    }
}
