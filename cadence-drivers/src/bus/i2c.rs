//! Bit-banged I2C master
//!
//! Both lines are open collector: writing `true` releases the line and
//! the pull-up (or a slave holding it low) decides the level. The
//! bit primitives live here; byte framing, acknowledge handling and
//! transactions come from [`cadence_hal::I2cBus`].
//!
//! The [`embedded_hal::i2c::I2c`] implementation runs a whole operation
//! list as one bus transaction: one start, a repeated start wherever the
//! direction changes, and one stop at the end.

use cadence_hal::i2c::I2cConfig;
use cadence_hal::{DelayNs, I2cError, I2cPrimitives, PinOc};
use embedded_hal::i2c::{ErrorType, I2c, Operation};

/// I2C master on two open-collector pins
pub struct I2cBitBang<SCL, SDA, D> {
    scl: SCL,
    sda: SDA,
    delay: D,
    half_period_ns: u32,
    started: bool,
}

impl<SCL: PinOc, SDA: PinOc, D: DelayNs> I2cBitBang<SCL, SDA, D> {
    /// Create the master; both lines are released
    pub fn new(mut scl: SCL, mut sda: SDA, delay: D, config: I2cConfig) -> Self {
        scl.write_flush(true);
        sda.write_flush(true);
        Self {
            scl,
            sda,
            delay,
            half_period_ns: config.half_period_ns(),
            started: false,
        }
    }

    /// Give back the pins and the delay
    pub fn release(self) -> (SCL, SDA, D) {
        (self.scl, self.sda, self.delay)
    }

    fn wait_half_period(&mut self) {
        self.delay.delay_ns(self.half_period_ns);
    }

    /// Everything between the start and the stop of an embedded-hal
    /// transaction; the caller sends the stop
    fn run_operations(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), I2cError> {
        let mut reading = None;
        let mut unacked_read = false;

        for operation in operations.iter_mut() {
            let read = matches!(operation, Operation::Read(_));
            if reading != Some(read) {
                if unacked_read {
                    self.write_nack();
                    unacked_read = false;
                }
                if !self.write_address(address, read) {
                    #[cfg(feature = "defmt")]
                    defmt::debug!("i2c: no device at {=u8:#x}", address);
                    return Err(I2cError::AddressNack { address });
                }
                reading = Some(read);
            }

            match operation {
                Operation::Write(data) => {
                    for (index, &byte) in data.iter().enumerate() {
                        self.write_byte(byte);
                        if !self.read_ack() {
                            return Err(I2cError::DataNack { index });
                        }
                    }
                }
                Operation::Read(buf) => {
                    for slot in buf.iter_mut() {
                        if unacked_read {
                            self.write_ack();
                        }
                        *slot = self.read_byte();
                        unacked_read = true;
                    }
                }
            }
        }

        if unacked_read {
            self.write_nack();
        }
        Ok(())
    }
}

impl<SCL: PinOc, SDA: PinOc, D: DelayNs> I2cPrimitives for I2cBitBang<SCL, SDA, D> {
    fn write_bit(&mut self, bit: bool) {
        self.scl.write_flush(false);
        self.wait_half_period();
        self.sda.write_flush(bit);
        self.scl.write_flush(true);
        self.wait_half_period();
    }

    fn read_bit(&mut self) -> bool {
        self.scl.write_flush(false);
        self.sda.write_flush(true);
        self.wait_half_period();
        self.scl.write_flush(true);
        self.wait_half_period();
        let bit = self.sda.refresh_read();
        self.wait_half_period();
        bit
    }

    fn write_start(&mut self) {
        if self.started {
            // repeated start: release SDA while SCL is low first
            self.scl.write_flush(false);
            self.sda.write_flush(true);
            self.wait_half_period();
        }
        self.sda.write_flush(true);
        self.scl.write_flush(true);
        self.wait_half_period();
        self.sda.write_flush(false);
        self.wait_half_period();
        self.scl.write_flush(false);
        self.started = true;
    }

    fn write_stop(&mut self) {
        self.scl.write_flush(false);
        self.wait_half_period();
        self.sda.write_flush(false);
        self.wait_half_period();
        self.scl.write_flush(true);
        self.wait_half_period();
        self.sda.write_flush(true);
        self.wait_half_period();
        self.started = false;
    }

    fn bus_idle(&mut self) -> bool {
        self.scl.refresh_read() && self.sda.refresh_read()
    }
}

impl<SCL, SDA, D> ErrorType for I2cBitBang<SCL, SDA, D> {
    type Error = I2cError;
}

impl<SCL: PinOc, SDA: PinOc, D: DelayNs> I2c for I2cBitBang<SCL, SDA, D> {
    /// Adjacent operations of the same kind share one address phase; the
    /// last byte read before a direction change or the stop is NACKed
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), I2cError> {
        if operations.is_empty() {
            return Ok(());
        }
        if !self.bus_idle() {
            #[cfg(feature = "defmt")]
            defmt::warn!("i2c: bus busy before start");
            return Err(I2cError::BusBusy);
        }

        let result = self.run_operations(address, operations);
        self.write_stop();
        result
    }
}
