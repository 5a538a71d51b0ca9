//! I2C bus abstractions
//!
//! A master only needs four primitives (a bit out, a bit in, start and
//! stop); everything else, from byte framing to acknowledge handling, is
//! built on top of them here. Transactions are RAII handles: the stop
//! condition is sent when the handle is dropped.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors from I2C transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// No device acknowledged the address
    AddressNack {
        /// 7-bit address that was sent
        address: u8,
    },
    /// The device refused a data byte
    DataNack {
        /// Index of the refused byte within the transaction
        index: usize,
    },
    /// SCL or SDA was held low before the start condition
    BusBusy,
}

impl embedded_hal::i2c::Error for I2cError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

        match self {
            I2cError::AddressNack { .. } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            I2cError::DataNack { .. } => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data),
            I2cError::BusBusy => ErrorKind::Bus,
        }
    }
}

/// Bit-level I2C master operations
pub trait I2cPrimitives {
    /// Clock one bit out
    fn write_bit(&mut self, bit: bool);

    /// Clock one bit in
    fn read_bit(&mut self) -> bool;

    /// Send a start condition
    fn write_start(&mut self);

    /// Send a stop condition
    fn write_stop(&mut self);

    /// Check that nobody holds the bus before a start condition
    fn bus_idle(&mut self) -> bool {
        true
    }

    /// Clock in the acknowledge bit; `true` means ACK
    fn read_ack(&mut self) -> bool {
        !self.read_bit()
    }

    /// Acknowledge a received byte
    fn write_ack(&mut self) {
        self.write_bit(false);
    }

    /// Refuse a received byte
    fn write_nack(&mut self) {
        self.write_bit(true);
    }

    /// Clock out a byte, MSB first
    fn write_byte(&mut self, byte: u8) {
        for i in (0..8).rev() {
            self.write_bit((byte >> i) & 1 != 0);
        }
    }

    /// Clock in a byte, MSB first
    fn read_byte(&mut self) -> u8 {
        (0..8).fold(0u8, |acc, _| (acc << 1) | u8::from(self.read_bit()))
    }

    /// Send a (repeated) start and the 7-bit `address` with the R/W bit;
    /// returns whether a device acknowledged
    ///
    /// No stop is sent on a NACK.
    fn write_address(&mut self, address: u8, read: bool) -> bool {
        self.write_start();
        self.write_byte(((address & 0x7F) << 1) | u8::from(read));
        self.read_ack()
    }
}

impl<P: I2cPrimitives + ?Sized> I2cPrimitives for &mut P {
    fn write_bit(&mut self, bit: bool) {
        (**self).write_bit(bit)
    }

    fn read_bit(&mut self) -> bool {
        (**self).read_bit()
    }

    fn write_start(&mut self) {
        (**self).write_start()
    }

    fn write_stop(&mut self) {
        (**self).write_stop()
    }

    fn bus_idle(&mut self) -> bool {
        (**self).bus_idle()
    }
}

/// Byte-level transactions, available on every set of primitives
pub trait I2cBus: I2cPrimitives {
    /// Begin a write to the device at the 7-bit `address`
    fn write(&mut self, address: u8) -> Result<I2cWriteTransaction<'_, Self>, I2cError> {
        I2cWriteTransaction::new(self, address)
    }

    /// Begin a read from the device at the 7-bit `address`
    fn read(&mut self, address: u8) -> Result<I2cReadTransaction<'_, Self>, I2cError> {
        I2cReadTransaction::new(self, address)
    }

    /// Write `data` in one transaction
    fn write_bytes(&mut self, address: u8, data: &[u8]) -> Result<(), I2cError> {
        let mut transaction = self.write(address)?;
        transaction.write_all(data)
    }

    /// Fill `buf` in one transaction
    fn read_bytes(&mut self, address: u8, buf: &mut [u8]) -> Result<(), I2cError> {
        let mut transaction = self.read(address)?;
        transaction.read(buf);
        Ok(())
    }

    /// Write `data`, stop, then read into `buf`
    ///
    /// Typically used to select a register and read it back.
    fn write_then_read(&mut self, address: u8, data: &[u8], buf: &mut [u8]) -> Result<(), I2cError> {
        self.write_bytes(address, data)?;
        self.read_bytes(address, buf)
    }
}

impl<P: I2cPrimitives + ?Sized> I2cBus for P {}

/// Open write transaction; the stop condition is sent on drop
pub struct I2cWriteTransaction<'a, P: I2cPrimitives + ?Sized> {
    primitives: &'a mut P,
    written: usize,
}

impl<'a, P: I2cPrimitives + ?Sized> I2cWriteTransaction<'a, P> {
    /// Send start and the address with R/W = 0
    pub fn new(primitives: &'a mut P, address: u8) -> Result<Self, I2cError> {
        address_device(primitives, address, false)?;
        Ok(Self {
            primitives,
            written: 0,
        })
    }

    /// Send one byte and check its acknowledge
    pub fn write(&mut self, byte: u8) -> Result<(), I2cError> {
        let index = self.written;
        self.primitives.write_byte(byte);
        self.written += 1;

        if self.primitives.read_ack() {
            Ok(())
        } else {
            #[cfg(feature = "defmt")]
            defmt::debug!("i2c: data byte {} refused", index);
            Err(I2cError::DataNack { index })
        }
    }

    /// Send bytes until the first refusal
    pub fn write_all(&mut self, data: &[u8]) -> Result<(), I2cError> {
        data.iter().try_for_each(|&byte| self.write(byte))
    }

    /// Number of bytes sent so far
    pub fn written(&self) -> usize {
        self.written
    }
}

impl<P: I2cPrimitives + ?Sized> Drop for I2cWriteTransaction<'_, P> {
    fn drop(&mut self) {
        self.primitives.write_stop();
    }
}

/// Open read transaction; NACK and stop are sent on drop
///
/// The acknowledge for a byte is sent just before the next byte is
/// clocked in, so the final byte is always refused with a NACK as the
/// protocol requires, without knowing the length in advance.
pub struct I2cReadTransaction<'a, P: I2cPrimitives + ?Sized> {
    primitives: &'a mut P,
    pending_ack: bool,
}

impl<'a, P: I2cPrimitives + ?Sized> I2cReadTransaction<'a, P> {
    /// Send start and the address with R/W = 1
    pub fn new(primitives: &'a mut P, address: u8) -> Result<Self, I2cError> {
        address_device(primitives, address, true)?;
        Ok(Self {
            primitives,
            pending_ack: false,
        })
    }

    /// Clock in the next byte
    pub fn read_byte(&mut self) -> u8 {
        if self.pending_ack {
            self.primitives.write_ack();
        }
        self.pending_ack = true;
        self.primitives.read_byte()
    }

    /// Fill `buf` with the next bytes
    pub fn read(&mut self, buf: &mut [u8]) {
        for byte in buf.iter_mut() {
            *byte = self.read_byte();
        }
    }
}

impl<P: I2cPrimitives + ?Sized> Drop for I2cReadTransaction<'_, P> {
    fn drop(&mut self) {
        if self.pending_ack {
            self.primitives.write_nack();
        }
        self.primitives.write_stop();
    }
}

/// Start condition plus address byte; leaves the bus stopped on failure
fn address_device<P: I2cPrimitives + ?Sized>(
    primitives: &mut P,
    address: u8,
    read: bool,
) -> Result<(), I2cError> {
    debug_assert!(address <= 0x7F);

    if !primitives.bus_idle() {
        #[cfg(feature = "defmt")]
        defmt::warn!("i2c: bus busy before start");
        return Err(I2cError::BusBusy);
    }

    if primitives.write_address(address, read) {
        Ok(())
    } else {
        primitives.write_stop();
        #[cfg(feature = "defmt")]
        defmt::debug!("i2c: no device at {=u8:#x}", address);
        Err(I2cError::AddressNack { address })
    }
}

/// I2C configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct I2cConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
}

impl Default for I2cConfig {
    fn default() -> Self {
        Self {
            frequency: 100_000, // 100kHz standard mode
        }
    }
}

impl I2cConfig {
    /// Standard mode (100 kHz)
    pub const STANDARD: Self = Self { frequency: 100_000 };

    /// Fast mode (400 kHz)
    pub const FAST: Self = Self { frequency: 400_000 };

    /// Fast mode plus (1 MHz)
    pub const FAST_PLUS: Self = Self {
        frequency: 1_000_000,
    };

    /// Half of one clock period in nanoseconds
    ///
    /// Must cover the slowest device's minimum SCL low/high time; clock
    /// stretching is not detected.
    pub const fn half_period_ns(&self) -> u32 {
        if self.frequency == 0 {
            return 0;
        }
        500_000_000 / self.frequency
    }
}
