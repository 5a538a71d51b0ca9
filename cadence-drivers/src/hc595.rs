//! 74HC595 shift register as an 8-pin output port
//!
//! The register is loaded over SPI. Its storage clock (RCLK) is used as
//! the chip select: the transaction pulls it low, and the rising edge
//! when the transaction ends copies the shifted byte to the outputs.

use cadence_hal::{PinOut, Port, PortOut, SpiBus};

/// 74HC595 output port
pub struct Hc595<B, S> {
    bus: B,
    latch: S,
    pending: u8,
}

impl<B: SpiBus, S: PinOut> Hc595<B, S> {
    /// Take the bus and the latch line; outputs keep their state until
    /// the first flush
    pub fn new(bus: B, mut latch: S) -> Self {
        latch.write_flush(true);
        Self {
            bus,
            latch,
            pending: 0,
        }
    }

    /// Change one buffered output; `pin` above 7 is ignored
    pub fn set_pin(&mut self, pin: u8, high: bool) {
        if pin >= 8 {
            return;
        }
        if high {
            self.pending |= 1 << pin;
        } else {
            self.pending &= !(1 << pin);
        }
    }

    /// Buffered output value
    pub fn pending(&self) -> u8 {
        self.pending
    }

    /// Single output as a pin; flushing it flushes the whole register
    pub fn pin(&mut self, pin: u8) -> Hc595Pin<'_, B, S> {
        Hc595Pin { chip: self, pin }
    }

    /// Give back the bus and the latch line
    pub fn release(self) -> (B, S) {
        (self.bus, self.latch)
    }
}

impl<B: SpiBus, S: PinOut> Port for Hc595<B, S> {
    fn number_of_pins(&self) -> u8 {
        8
    }
}

impl<B: SpiBus, S: PinOut> PortOut for Hc595<B, S> {
    fn write(&mut self, value: u16) {
        self.pending = value as u8;
    }

    fn flush(&mut self) {
        let mut transaction = self.bus.transaction(&mut self.latch);
        if transaction.write_byte(self.pending).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("hc595: shift failed");
        }
    }
}

/// One output of a [`Hc595`]
pub struct Hc595Pin<'a, B: SpiBus, S: PinOut> {
    chip: &'a mut Hc595<B, S>,
    pin: u8,
}

impl<B: SpiBus, S: PinOut> PinOut for Hc595Pin<'_, B, S> {
    fn write(&mut self, high: bool) {
        self.chip.set_pin(self.pin, high);
    }

    fn flush(&mut self) {
        self.chip.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_hal_sim::{RecordingSpi, Wire};

    #[test]
    fn test_flush_shifts_and_latches() {
        let spi = RecordingSpi::new();
        let latch = Wire::new(false);
        let mut chip = Hc595::new(spi.clone(), latch.output());

        chip.write(0xA5);
        assert!(spi.frames().is_empty());
        chip.flush();

        assert_eq!(spi.frames(), [vec![0xA5]]);
        assert_eq!(latch.history(), [true, false, true]);
    }

    #[test]
    fn test_set_pin_edits_buffer() {
        let spi = RecordingSpi::new();
        let mut chip = Hc595::new(spi.clone(), Wire::new(true).output());

        chip.write(0b1000_0001);
        chip.set_pin(1, true);
        chip.set_pin(7, false);
        chip.set_pin(9, true);
        assert_eq!(chip.pending(), 0b0000_0011);
    }

    #[test]
    fn test_single_pin_view() {
        let spi = RecordingSpi::new();
        let mut chip = Hc595::new(spi.clone(), Wire::new(true).output());

        chip.pin(3).write_flush(true);
        chip.pin(0).write_flush(true);
        chip.pin(3).write_flush(false);

        assert_eq!(spi.frames(), [vec![0x08], vec![0x09], vec![0x01]]);
    }

    #[test]
    fn test_port_width() {
        let chip = Hc595::new(RecordingSpi::new(), Wire::new(true).output());
        assert_eq!(chip.number_of_pins(), 8);
    }
}
