//! GPIO pin abstractions
//!
//! Pins are two-phase. Outputs are written into a buffer and reach the
//! physical line on [`PinOut::flush`]; inputs are latched by
//! [`PinIn::refresh`] and [`PinIn::read`] returns the latched value.
//! A backend that drives a whole port register can therefore batch
//! several pin writes into one register access.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Pin direction for pins that can switch at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// High-impedance input
    Input,
    /// Push-pull output
    Output,
    /// Open-collector output: low is driven, high releases the line
    OpenCollector,
}

/// Digital output pin
pub trait PinOut {
    /// Set the buffered output level
    fn write(&mut self, high: bool);

    /// Commit the buffered level to the physical line
    fn flush(&mut self);

    /// Write and immediately flush
    fn write_flush(&mut self, high: bool) {
        self.write(high);
        self.flush();
    }
}

/// Digital input pin
pub trait PinIn {
    /// Level latched by the last [`refresh`](PinIn::refresh)
    fn read(&self) -> bool;

    /// Latch the current level of the physical line
    ///
    /// Backends that read the line directly can keep the default no-op.
    fn refresh(&mut self) {}

    /// Refresh then read
    fn refresh_read(&mut self) -> bool {
        self.refresh();
        self.read()
    }
}

/// Open-collector pin
///
/// Writing `false` pulls the line low, writing `true` releases it so that
/// another party (or the pull-up) decides the level seen by `read`.
pub trait PinOc: PinIn + PinOut {}

/// Pin whose direction can change at runtime
pub trait PinInOut: PinIn + PinOut {
    /// Switch the pin direction
    fn set_direction(&mut self, direction: Direction);
}

impl<P: PinOut + ?Sized> PinOut for &mut P {
    fn write(&mut self, high: bool) {
        (**self).write(high)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

impl<P: PinIn + ?Sized> PinIn for &mut P {
    fn read(&self) -> bool {
        (**self).read()
    }

    fn refresh(&mut self) {
        (**self).refresh()
    }
}

impl<P: PinOc + ?Sized> PinOc for &mut P {}

impl<P: PinInOut + ?Sized> PinInOut for &mut P {
    fn set_direction(&mut self, direction: Direction) {
        (**self).set_direction(direction)
    }
}

/// Pin decorator that inverts the level in both directions
///
/// Useful for active-low LEDs, switches to ground and similar wiring.
#[derive(Debug)]
pub struct Invert<P> {
    pin: P,
}

impl<P> Invert<P> {
    /// Wrap a pin
    pub const fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Unwrap the decorated pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: PinOut> PinOut for Invert<P> {
    fn write(&mut self, high: bool) {
        self.pin.write(!high);
    }

    fn flush(&mut self) {
        self.pin.flush();
    }
}

impl<P: PinIn> PinIn for Invert<P> {
    fn read(&self) -> bool {
        !self.pin.read()
    }

    fn refresh(&mut self) {
        self.pin.refresh();
    }
}

impl<P: PinOc> PinOc for Invert<P> {}

impl<P: PinInOut> PinInOut for Invert<P> {
    fn set_direction(&mut self, direction: Direction) {
        self.pin.set_direction(direction);
    }
}

/// Output adapter over an `embedded-hal` output pin
///
/// The level is buffered until [`PinOut::flush`]. Errors reported by the
/// underlying pin are dropped.
#[derive(Debug)]
pub struct DigitalOut<P> {
    pin: P,
    pending: bool,
}

impl<P: OutputPin> DigitalOut<P> {
    /// Wrap a pin; nothing is driven until the first flush
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            pending: false,
        }
    }

    /// Unwrap the underlying pin
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> PinOut for DigitalOut<P> {
    fn write(&mut self, high: bool) {
        self.pending = high;
    }

    fn flush(&mut self) {
        if self.pin.set_state(PinState::from(self.pending)).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("gpio: output flush failed");
        }
    }
}

/// Input adapter over an `embedded-hal` input pin
///
/// [`PinIn::refresh`] samples the pin; a failed sample keeps the previous
/// latched value.
#[derive(Debug)]
pub struct DigitalIn<P> {
    pin: P,
    latched: bool,
}

impl<P: InputPin> DigitalIn<P> {
    /// Wrap a pin; reads return `false` until the first refresh
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            latched: false,
        }
    }

    /// Unwrap the underlying pin
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> PinIn for DigitalIn<P> {
    fn read(&self) -> bool {
        self.latched
    }

    fn refresh(&mut self) {
        match self.pin.is_high() {
            Ok(high) => self.latched = high,
            Err(_) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("gpio: input refresh failed");
            }
        }
    }
}

/// Open-drain adapter over an `embedded-hal` pin that is both readable
/// and writable
#[derive(Debug)]
pub struct DigitalOc<P> {
    pin: P,
    pending: bool,
    latched: bool,
}

impl<P: InputPin + OutputPin> DigitalOc<P> {
    /// Wrap a pin; the line counts as released until told otherwise
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            pending: true,
            latched: true,
        }
    }

    /// Unwrap the underlying pin
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin + OutputPin> PinOut for DigitalOc<P> {
    fn write(&mut self, high: bool) {
        self.pending = high;
    }

    fn flush(&mut self) {
        if self.pin.set_state(PinState::from(self.pending)).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("gpio: open-drain flush failed");
        }
    }
}

impl<P: InputPin + OutputPin> PinIn for DigitalOc<P> {
    fn read(&self) -> bool {
        self.latched
    }

    fn refresh(&mut self) {
        if let Ok(high) = self.pin.is_high() {
            self.latched = high;
        }
    }
}

impl<P: InputPin + OutputPin> PinOc for DigitalOc<P> {}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as MockState, Transaction as PinTransaction,
    };

    /// Output pin that remembers the buffered and the committed level
    struct MockOut {
        buffered: bool,
        line: bool,
        flushes: u32,
    }

    impl MockOut {
        fn new() -> Self {
            Self {
                buffered: false,
                line: false,
                flushes: 0,
            }
        }
    }

    impl PinOut for MockOut {
        fn write(&mut self, high: bool) {
            self.buffered = high;
        }

        fn flush(&mut self) {
            self.line = self.buffered;
            self.flushes += 1;
        }
    }

    struct MockIn {
        line: bool,
        latched: bool,
    }

    impl PinIn for MockIn {
        fn read(&self) -> bool {
            self.latched
        }

        fn refresh(&mut self) {
            self.latched = self.line;
        }
    }

    #[test]
    fn test_write_is_not_visible_before_flush() {
        let mut pin = MockOut::new();
        pin.write(true);
        assert!(!pin.line);

        pin.flush();
        assert!(pin.line);
        assert_eq!(pin.flushes, 1);
    }

    #[test]
    fn test_read_returns_latched_value() {
        let mut pin = MockIn {
            line: true,
            latched: false,
        };
        assert!(!pin.read());
        assert!(pin.refresh_read());

        pin.line = false;
        assert!(pin.read());
    }

    #[test]
    fn test_invert_output() {
        let mut pin = Invert::new(MockOut::new());
        pin.write_flush(true);
        assert!(!pin.into_inner().line);
    }

    #[test]
    fn test_invert_input() {
        let mut pin = Invert::new(MockIn {
            line: false,
            latched: false,
        });
        pin.refresh();
        assert!(pin.read());
    }

    #[test]
    fn test_mut_reference_forwards() {
        fn drive<P: PinOut>(mut pin: P) {
            pin.write_flush(true);
        }

        let mut pin = MockOut::new();
        drive(&mut pin);
        assert!(pin.line);
    }

    #[test]
    fn test_digital_out_buffers_until_flush() {
        let expectations = [
            PinTransaction::set(MockState::High),
            PinTransaction::set(MockState::Low),
        ];
        let mut mock = PinMock::new(&expectations);

        let mut pin = DigitalOut::new(mock.clone());
        pin.write(false);
        pin.write(true);
        pin.flush();
        pin.write(false);
        pin.flush();

        mock.done();
    }

    #[test]
    fn test_digital_in_latches_on_refresh() {
        let expectations = [
            PinTransaction::get(MockState::High),
            PinTransaction::get(MockState::Low),
        ];
        let mut mock = PinMock::new(&expectations);

        let mut pin = DigitalIn::new(mock.clone());
        assert!(!pin.read());
        pin.refresh();
        assert!(pin.read());
        assert!(pin.read());
        pin.refresh();
        assert!(!pin.read());

        mock.done();
    }

    #[test]
    fn test_digital_oc_buffers_and_latches() {
        let expectations = [
            PinTransaction::set(MockState::Low),
            PinTransaction::get(MockState::Low),
            PinTransaction::set(MockState::High),
            PinTransaction::get(MockState::High),
        ];
        let mut mock = PinMock::new(&expectations);

        let mut pin = DigitalOc::new(mock.clone());
        assert!(pin.read());
        pin.write(false);
        pin.flush();
        assert!(pin.read());
        pin.refresh();
        assert!(!pin.read());

        pin.write_flush(true);
        assert!(pin.refresh_read());

        mock.done();
    }
}
