//! Fail-stop handling
//!
//! When a lower layer hits an inconsistency it cannot recover from, the
//! system stops doing anything else and plays a fixed pattern on an
//! indicator pin forever. The scheduler is never resumed.
//!
//! On target this is typically wired into the panic handler:
//!
//! ```ignore
//! #[panic_handler]
//! fn panic(_: &core::panic::PanicInfo) -> ! {
//!     FailStop::new(board::led(), board::delay()).halt()
//! }
//! ```

use cadence_hal::{DelayNs, PinOut};

/// Flashes per pattern cycle
pub const FLASH_COUNT: u8 = 3;

/// Length of one flash, and of the gap after it
pub const FLASH_MS: u32 = 100;

/// Dark time closing each cycle
pub const DARK_MS: u32 = 700;

/// Persistent halt indicator
pub struct FailStop<P: PinOut, D: DelayNs> {
    pin: P,
    delay: D,
}

impl<P: PinOut, D: DelayNs> FailStop<P, D> {
    /// Take the indicator pin and a delay; the pin is switched off
    pub fn new(mut pin: P, delay: D) -> Self {
        pin.write_flush(false);
        Self { pin, delay }
    }

    /// Play one cycle of the pattern
    pub fn signal_once(&mut self) {
        for _ in 0..FLASH_COUNT {
            self.pin.write_flush(true);
            self.delay.delay_ms(FLASH_MS);
            self.pin.write_flush(false);
            self.delay.delay_ms(FLASH_MS);
        }
        self.delay.delay_ms(DARK_MS);
    }

    /// Stop everything and signal forever
    pub fn halt(mut self) -> ! {
        #[cfg(feature = "defmt")]
        defmt::error!("fail-stop: halted");

        loop {
            self.signal_once();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_hal_sim::{SimClock, SimDelay, Wire};

    #[test]
    fn test_pattern_cycle() {
        let clock = SimClock::new();
        let led = Wire::new(true);
        let mut fail_stop = FailStop::new(led.output(), SimDelay::new(clock.clone()));
        assert!(!led.level());

        fail_stop.signal_once();

        assert_eq!(
            led.history(),
            [false, true, false, true, false, true, false]
        );
        assert_eq!(clock.now(), 1_300_000);
    }

    #[test]
    fn test_pattern_repeats_identically() {
        let clock = SimClock::new();
        let led = Wire::new(false);
        let mut fail_stop = FailStop::new(led.output(), SimDelay::new(clock.clone()));

        fail_stop.signal_once();
        let first = led.history();
        fail_stop.signal_once();

        assert_eq!(led.history().len(), 2 * first.len() - 1);
        assert_eq!(led.transitions(), 12);
        assert_eq!(clock.now(), 2_600_000);
    }
}
