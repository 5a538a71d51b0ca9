//! PCF8574 I2C port expander as an 8-pin open-collector port
//!
//! The chip has no registers: writing one byte sets the eight
//! quasi-bidirectional lines, reading one byte samples them. A line
//! written high is released, so it doubles as an input.

use cadence_hal::{I2cBus, PinIn, PinOc, PinOut, Port, PortIn, PortOc, PortOut};

/// PCF8574 port
///
/// Writes are buffered and only sent when they changed something; reads
/// return the byte sampled by the last refresh.
pub struct Pcf8574<B> {
    bus: B,
    address: u8,
    write_buffer: u8,
    read_buffer: u8,
    dirty: bool,
}

impl<B: I2cBus> Pcf8574<B> {
    /// Chip at the 7-bit `address` (0x20..=0x27, or 0x38..=0x3F for the
    /// A variant); all lines start released
    pub fn new(bus: B, address: u8) -> Self {
        Self {
            bus,
            address,
            write_buffer: 0xFF,
            read_buffer: 0xFF,
            dirty: false,
        }
    }

    /// Change one buffered line; `pin` above 7 is ignored
    pub fn set_pin(&mut self, pin: u8, high: bool) {
        if pin >= 8 {
            return;
        }
        let value = if high {
            self.write_buffer | (1 << pin)
        } else {
            self.write_buffer & !(1 << pin)
        };
        self.write(u16::from(value));
    }

    /// Single line as a pin; flushing or refreshing it does the whole chip
    pub fn pin(&mut self, pin: u8) -> Pcf8574Pin<'_, B> {
        Pcf8574Pin { chip: self, pin }
    }

    /// 7-bit bus address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the bus
    pub fn release(self) -> B {
        self.bus
    }
}

impl<B: I2cBus> Port for Pcf8574<B> {
    fn number_of_pins(&self) -> u8 {
        8
    }
}

impl<B: I2cBus> PortOut for Pcf8574<B> {
    fn write(&mut self, value: u16) {
        self.write_buffer = value as u8;
        self.dirty = true;
    }

    /// Failed writes stay pending and are retried by the next flush
    fn flush(&mut self) {
        if !self.dirty {
            return;
        }
        match self.bus.write_bytes(self.address, &[self.write_buffer]) {
            Ok(()) => self.dirty = false,
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("pcf8574: write failed: {}", _e);
            }
        }
    }
}

impl<B: I2cBus> PortIn for Pcf8574<B> {
    fn read(&self) -> u16 {
        u16::from(self.read_buffer)
    }

    /// A failed read keeps the previous sample
    fn refresh(&mut self) {
        let mut buf = [0u8; 1];
        match self.bus.read_bytes(self.address, &mut buf) {
            Ok(()) => self.read_buffer = buf[0],
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("pcf8574: read failed: {}", _e);
            }
        }
    }
}

impl<B: I2cBus> PortOc for Pcf8574<B> {}

/// One line of a [`Pcf8574`]
pub struct Pcf8574Pin<'a, B: I2cBus> {
    chip: &'a mut Pcf8574<B>,
    pin: u8,
}

impl<B: I2cBus> PinOut for Pcf8574Pin<'_, B> {
    fn write(&mut self, high: bool) {
        self.chip.set_pin(self.pin, high);
    }

    fn flush(&mut self) {
        self.chip.flush();
    }
}

impl<B: I2cBus> PinIn for Pcf8574Pin<'_, B> {
    fn read(&self) -> bool {
        self.pin < 8 && self.chip.read_buffer & (1 << self.pin) != 0
    }

    fn refresh(&mut self) {
        self.chip.refresh();
    }
}

impl<B: I2cBus> PinOc for Pcf8574Pin<'_, B> {}
