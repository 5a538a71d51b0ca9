//! Port abstractions
//!
//! A port is a fixed-width vector of pins accessed as one unsigned value,
//! bit *i* mapping to pin *i*. Ports follow the same two-phase contract
//! as pins: `write` + `flush`, `refresh` + `read`.

use crate::gpio::{PinIn, PinOc, PinOut};

/// Maximum number of pins in a port
pub const MAX_PORT_PINS: usize = 16;

/// Common port properties
pub trait Port {
    /// Number of pins in the port
    fn number_of_pins(&self) -> u8;
}

/// Output port
pub trait PortOut: Port {
    /// Buffer a new value for the port
    fn write(&mut self, value: u16);

    /// Commit the buffered value to the pins
    fn flush(&mut self);
}

/// Input port
pub trait PortIn: Port {
    /// Value latched by the last [`refresh`](PortIn::refresh)
    fn read(&self) -> u16;

    /// Latch the current pin levels
    fn refresh(&mut self) {}
}

/// Open-collector port
pub trait PortOc: PortIn + PortOut {}

impl<P: Port + ?Sized> Port for &mut P {
    fn number_of_pins(&self) -> u8 {
        (**self).number_of_pins()
    }
}

impl<P: PortOut + ?Sized> PortOut for &mut P {
    fn write(&mut self, value: u16) {
        (**self).write(value)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

impl<P: PortIn + ?Sized> PortIn for &mut P {
    fn read(&self) -> u16 {
        (**self).read()
    }

    fn refresh(&mut self) {
        (**self).refresh()
    }
}

impl<P: PortOc + ?Sized> PortOc for &mut P {}

/// Port assembled from individual pins
///
/// Implements whichever port traits the pin type supports. Use
/// `&mut dyn PinOut` (or another trait object) as `P` to combine pins of
/// different concrete types.
#[derive(Debug)]
pub struct PortFromPins<P, const N: usize> {
    pins: [P; N],
}

impl<P, const N: usize> PortFromPins<P, N> {
    const VALID: () = assert!(N <= MAX_PORT_PINS, "a port holds at most 16 pins");

    /// Create a port; pin 0 is the least significant bit
    ///
    /// `N` above [`MAX_PORT_PINS`] fails to compile.
    pub fn new(pins: [P; N]) -> Self {
        let () = Self::VALID;
        Self { pins }
    }

    /// Unwrap the pins
    pub fn release(self) -> [P; N] {
        self.pins
    }
}

impl<P, const N: usize> Port for PortFromPins<P, N> {
    fn number_of_pins(&self) -> u8 {
        N as u8
    }
}

impl<P: PinOut, const N: usize> PortOut for PortFromPins<P, N> {
    fn write(&mut self, value: u16) {
        for (i, pin) in self.pins.iter_mut().enumerate() {
            pin.write(value & (1 << i) != 0);
        }
    }

    fn flush(&mut self) {
        for pin in self.pins.iter_mut() {
            pin.flush();
        }
    }
}

impl<P: PinIn, const N: usize> PortIn for PortFromPins<P, N> {
    fn read(&self) -> u16 {
        self.pins
            .iter()
            .enumerate()
            .filter(|(_, pin)| pin.read())
            .fold(0, |acc, (i, _)| acc | (1 << i))
    }

    fn refresh(&mut self) {
        for pin in self.pins.iter_mut() {
            pin.refresh();
        }
    }
}

impl<P: PinOc, const N: usize> PortOc for PortFromPins<P, N> {}

/// Port decorator that inverts every pin
#[derive(Debug)]
pub struct InvertPort<P> {
    port: P,
}

impl<P: Port> InvertPort<P> {
    /// Wrap a port
    pub const fn new(port: P) -> Self {
        Self { port }
    }

    /// Unwrap the decorated port
    pub fn into_inner(self) -> P {
        self.port
    }

    fn mask(&self) -> u16 {
        match self.port.number_of_pins() {
            n if n as usize >= MAX_PORT_PINS => u16::MAX,
            n => (1u16 << n) - 1,
        }
    }
}

impl<P: Port> Port for InvertPort<P> {
    fn number_of_pins(&self) -> u8 {
        self.port.number_of_pins()
    }
}

impl<P: PortOut> PortOut for InvertPort<P> {
    fn write(&mut self, value: u16) {
        let inverted = !value & self.mask();
        self.port.write(inverted);
    }

    fn flush(&mut self) {
        self.port.flush();
    }
}

impl<P: PortIn> PortIn for InvertPort<P> {
    fn read(&self) -> u16 {
        !self.port.read() & self.mask()
    }

    fn refresh(&mut self) {
        self.port.refresh();
    }
}

impl<P: PortOc> PortOc for InvertPort<P> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockPin {
        buffered: bool,
        line: bool,
        latched: bool,
    }

    impl PinOut for MockPin {
        fn write(&mut self, high: bool) {
            self.buffered = high;
        }

        fn flush(&mut self) {
            self.line = self.buffered;
        }
    }

    impl PinIn for MockPin {
        fn read(&self) -> bool {
            self.latched
        }

        fn refresh(&mut self) {
            self.latched = self.line;
        }
    }

    fn pins<const N: usize>() -> [MockPin; N] {
        core::array::from_fn(|_| MockPin::default())
    }

    #[test]
    fn test_write_maps_bits_to_pins() {
        let mut port = PortFromPins::new(pins::<4>());
        port.write(0b0101);
        port.flush();

        let lines = port.release().map(|p| p.line);
        assert_eq!(lines, [true, false, true, false]);
    }

    #[test]
    fn test_write_needs_flush() {
        let mut port = PortFromPins::new(pins::<2>());
        port.write(0b11);

        let lines = port.release().map(|p| p.line);
        assert_eq!(lines, [false, false]);
    }

    #[test]
    fn test_read_packs_latched_pins() {
        let mut raw = pins::<3>();
        raw[0].line = true;
        raw[2].line = true;
        let mut port = PortFromPins::new(raw);

        assert_eq!(port.read(), 0);
        port.refresh();
        assert_eq!(port.read(), 0b101);
    }

    #[test]
    fn test_widest_port_reaches_top_bit() {
        let mut port = PortFromPins::new(pins::<MAX_PORT_PINS>());
        assert_eq!(port.number_of_pins(), 16);

        port.write(0x8001);
        port.flush();
        port.refresh();
        assert_eq!(port.read(), 0x8001);
    }

    #[test]
    fn test_mixed_pins_through_trait_objects() {
        let mut a = MockPin::default();
        let mut b = MockPin::default();
        {
            let mixed: [&mut dyn PinOut; 2] = [&mut a, &mut b];
            let mut port = PortFromPins::new(mixed);
            assert_eq!(port.number_of_pins(), 2);
            port.write(0b10);
            port.flush();
        }
        assert!(!a.line);
        assert!(b.line);
    }

    #[test]
    fn test_invert_port_masks_to_width() {
        let mut port = InvertPort::new(PortFromPins::new(pins::<3>()));
        port.write(0b001);
        port.flush();
        port.refresh();
        assert_eq!(port.read(), 0b001);

        let lines = port.into_inner().release().map(|p| p.line);
        assert_eq!(lines, [false, true, true]);
    }
}
