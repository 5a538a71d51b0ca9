//! Bit-banged SPI master
//!
//! Bytes are shifted MSB first. Clock polarity and phase come from the
//! [`SpiConfig`]; each bit takes two half periods and one more half
//! period is spent after the last byte so the slave sees a settled line
//! before chip select goes away.

use cadence_hal::spi::{Phase, Polarity, SpiConfig};
use cadence_hal::{DelayNs, PinIn, PinOut, SpiBus, SpiError};
use embedded_hal::spi::{ErrorType, SpiBus as EhSpiBus};

/// SPI master driving SCLK/MOSI and sampling MISO
pub struct SpiBitBang<SCLK, MOSI, MISO, D> {
    sclk: SCLK,
    mosi: MOSI,
    miso: MISO,
    delay: D,
    config: SpiConfig,
}

impl<SCLK, MOSI, MISO, D> SpiBitBang<SCLK, MOSI, MISO, D>
where
    SCLK: PinOut,
    MOSI: PinOut,
    MISO: PinIn,
    D: DelayNs,
{
    /// Create the master and park the clock at its idle level
    pub fn new(mut sclk: SCLK, mut mosi: MOSI, miso: MISO, delay: D, config: SpiConfig) -> Self {
        sclk.write_flush(config.polarity == Polarity::IdleHigh);
        mosi.write_flush(false);
        Self {
            sclk,
            mosi,
            miso,
            delay,
            config,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &SpiConfig {
        &self.config
    }

    /// Give back the pins and the delay
    pub fn release(self) -> (SCLK, MOSI, MISO, D) {
        (self.sclk, self.mosi, self.miso, self.delay)
    }

    fn idle_level(&self) -> bool {
        self.config.polarity == Polarity::IdleHigh
    }

    fn wait_half_period(&mut self) {
        self.delay.delay_ns(self.config.half_period_ns());
    }

    fn sample(&mut self, byte: u8) -> u8 {
        (byte << 1) | u8::from(self.miso.refresh_read())
    }

    fn transfer_byte(&mut self, out: u8) -> u8 {
        let idle = self.idle_level();
        let mut input = 0u8;

        for i in (0..8).rev() {
            let bit = (out >> i) & 1 != 0;
            match self.config.phase {
                Phase::CaptureOnFirstTransition => {
                    self.mosi.write_flush(bit);
                    self.wait_half_period();
                    self.sclk.write_flush(!idle);
                    self.wait_half_period();
                    input = self.sample(input);
                    self.sclk.write_flush(idle);
                }
                Phase::CaptureOnSecondTransition => {
                    self.sclk.write_flush(!idle);
                    self.mosi.write_flush(bit);
                    self.wait_half_period();
                    self.sclk.write_flush(idle);
                    input = self.sample(input);
                    self.wait_half_period();
                }
            }
        }

        input
    }
}

impl<SCLK, MOSI, MISO, D> SpiBus for SpiBitBang<SCLK, MOSI, MISO, D>
where
    SCLK: PinOut,
    MOSI: PinOut,
    MISO: PinIn,
    D: DelayNs,
{
    fn write_and_read(
        &mut self,
        n: usize,
        data_out: Option<&[u8]>,
        mut data_in: Option<&mut [u8]>,
    ) -> Result<(), SpiError> {
        if data_out.is_some_and(|data| data.len() < n)
            || data_in.as_deref().is_some_and(|data| data.len() < n)
        {
            #[cfg(feature = "defmt")]
            defmt::warn!("spi: buffer shorter than {} bytes", n);
            return Err(SpiError::BufferTooShort);
        }

        for i in 0..n {
            let out = data_out.map_or(0, |data| data[i]);
            let received = self.transfer_byte(out);
            if let Some(input) = data_in.as_deref_mut() {
                input[i] = received;
            }
        }
        self.wait_half_period();

        Ok(())
    }
}

impl<SCLK, MOSI, MISO, D> ErrorType for SpiBitBang<SCLK, MOSI, MISO, D> {
    type Error = SpiError;
}

impl<SCLK, MOSI, MISO, D> EhSpiBus<u8> for SpiBitBang<SCLK, MOSI, MISO, D>
where
    SCLK: PinOut,
    MOSI: PinOut,
    MISO: PinIn,
    D: DelayNs,
{
    fn read(&mut self, words: &mut [u8]) -> Result<(), SpiError> {
        self.write_and_read(words.len(), None, Some(words))
    }

    fn write(&mut self, words: &[u8]) -> Result<(), SpiError> {
        self.write_and_read(words.len(), Some(words), None)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), SpiError> {
        // the longer buffer sets the length; missing output bytes are zero
        for i in 0..read.len().max(write.len()) {
            let received = self.transfer_byte(write.get(i).copied().unwrap_or(0));
            if let Some(slot) = read.get_mut(i) {
                *slot = received;
            }
        }
        self.wait_half_period();
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), SpiError> {
        for word in words.iter_mut() {
            *word = self.transfer_byte(*word);
        }
        self.wait_half_period();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SpiError> {
        Ok(())
    }
}
