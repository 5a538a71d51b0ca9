//! SPI bus abstractions
//!
//! A bus shifts bytes; chip select framing is done by [`SpiTransaction`],
//! which asserts the select line when created and deasserts it when
//! dropped. The transaction holds the bus exclusively, so two
//! transactions can never interleave on the same bus.

use crate::gpio::PinOut;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors from SPI transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError {
    /// A supplied buffer holds fewer bytes than the transfer length
    BufferTooShort,
}

impl embedded_hal::spi::Error for SpiError {
    fn kind(&self) -> embedded_hal::spi::ErrorKind {
        embedded_hal::spi::ErrorKind::Other
    }
}

/// SPI bus master
pub trait SpiBus {
    /// Shift `n` bytes out while shifting `n` bytes in, MSB first
    ///
    /// `data_out == None` sends zero bytes; `data_in == None` discards
    /// what was received. Buffers shorter than `n` are rejected before
    /// anything is clocked.
    fn write_and_read(
        &mut self,
        n: usize,
        data_out: Option<&[u8]>,
        data_in: Option<&mut [u8]>,
    ) -> Result<(), SpiError>;

    /// Start a transaction framed by `select` (active low)
    fn transaction<'a, S: PinOut + ?Sized>(
        &'a mut self,
        select: &'a mut S,
    ) -> SpiTransaction<'a, Self, S>
    where
        Self: Sized,
    {
        SpiTransaction::new(self, select)
    }
}

impl<B: SpiBus + ?Sized> SpiBus for &mut B {
    fn write_and_read(
        &mut self,
        n: usize,
        data_out: Option<&[u8]>,
        data_in: Option<&mut [u8]>,
    ) -> Result<(), SpiError> {
        (**self).write_and_read(n, data_out, data_in)
    }
}

/// One chip-select framed exchange on an SPI bus
pub struct SpiTransaction<'a, B: SpiBus + ?Sized, S: PinOut + ?Sized> {
    bus: &'a mut B,
    select: &'a mut S,
}

impl<'a, B: SpiBus + ?Sized, S: PinOut + ?Sized> SpiTransaction<'a, B, S> {
    /// Assert `select` and take the bus for the lifetime of the transaction
    pub fn new(bus: &'a mut B, select: &'a mut S) -> Self {
        select.write(false);
        select.flush();
        Self { bus, select }
    }

    /// Full-duplex transfer, see [`SpiBus::write_and_read`]
    pub fn write_and_read(
        &mut self,
        n: usize,
        data_out: Option<&[u8]>,
        data_in: Option<&mut [u8]>,
    ) -> Result<(), SpiError> {
        self.bus.write_and_read(n, data_out, data_in)
    }

    /// Write bytes, discarding what comes back
    pub fn write(&mut self, data: &[u8]) -> Result<(), SpiError> {
        self.bus.write_and_read(data.len(), Some(data), None)
    }

    /// Write a single byte
    pub fn write_byte(&mut self, byte: u8) -> Result<(), SpiError> {
        self.bus
            .write_and_read(1, Some(core::slice::from_ref(&byte)), None)
    }

    /// Read bytes while sending zeros
    pub fn read(&mut self, buf: &mut [u8]) -> Result<(), SpiError> {
        self.bus.write_and_read(buf.len(), None, Some(buf))
    }

    /// Read a single byte while sending zero
    pub fn read_byte(&mut self) -> Result<u8, SpiError> {
        let mut byte = [0u8];
        self.bus.write_and_read(1, None, Some(&mut byte[..]))?;
        Ok(byte[0])
    }
}

impl<B: SpiBus + ?Sized, S: PinOut + ?Sized> Drop for SpiTransaction<'_, B, S> {
    fn drop(&mut self) {
        self.select.write(true);
        self.select.flush();
    }
}

/// SPI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpiConfig {
    /// Clock frequency in Hz
    pub frequency: u32,
    /// Clock polarity
    pub polarity: Polarity,
    /// Clock phase
    pub phase: Phase,
}

impl Default for SpiConfig {
    fn default() -> Self {
        Self {
            frequency: 500_000, // 1 µs half period
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
        }
    }
}

impl SpiConfig {
    /// Configuration for a mode at the default frequency
    pub fn from_mode(mode: Mode) -> Self {
        let (polarity, phase) = mode.into();
        Self {
            polarity,
            phase,
            ..Self::default()
        }
    }

    /// Same configuration at another frequency
    pub const fn with_frequency(self, frequency: u32) -> Self {
        Self { frequency, ..self }
    }

    /// Half of one clock period in nanoseconds
    pub const fn half_period_ns(&self) -> u32 {
        if self.frequency == 0 {
            return 0;
        }
        500_000_000 / self.frequency
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}
