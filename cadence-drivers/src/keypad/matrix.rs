//! Switch matrix scanning
//!
//! Outputs are open collector: one is pulled low at a time while the
//! rest are released, and inputs have pull-ups, so input `y` reads low
//! exactly when the switch between the driven output `x` and `y` is
//! closed. There is no debounce filter.

use cadence_hal::{DelayNs, PortIn, PortOc};

/// Default settle time after driving an output (µs)
pub const DEFAULT_SETTLE_US: u32 = 1_000;

/// Matrix of switches between an output port and an input port
pub struct SwitchMatrix<O, I, D> {
    outputs: O,
    inputs: I,
    delay: D,
    settle_us: u32,
}

impl<O: PortOc, I: PortIn, D: DelayNs> SwitchMatrix<O, I, D> {
    /// Take the ports; all outputs are released
    pub fn new(mut outputs: O, inputs: I, delay: D, settle_us: u32) -> Self {
        outputs.write(u16::MAX);
        outputs.flush();
        Self {
            outputs,
            inputs,
            delay,
            settle_us,
        }
    }

    /// Number of outputs and inputs
    pub fn size(&self) -> (u8, u8) {
        (
            self.outputs.number_of_pins(),
            self.inputs.number_of_pins(),
        )
    }

    /// Drive output `x` low and return the inputs that follow it low
    ///
    /// Bit `y` of the result is set when switch `(x, y)` is closed.
    pub fn scan_output(&mut self, x: u8) -> u16 {
        let (outputs, inputs) = self.size();
        if x >= outputs {
            return 0;
        }

        self.outputs.write(!(1u16 << x));
        self.outputs.flush();
        self.delay.delay_us(self.settle_us);
        self.inputs.refresh();
        let closed = !self.inputs.read() & width_mask(inputs);
        self.release();
        closed
    }

    /// Whether switch `(x, y)` is closed
    pub fn switch_is_closed_at(&mut self, x: u8, y: u8) -> bool {
        y < self.size().1 && self.scan_output(x) & (1 << y) != 0
    }

    /// Closed switch with the lowest input `y`, then the lowest output `x`
    ///
    /// This is row-major order: for a keypad it is the key earliest in
    /// the translation string. Every output is driven once.
    pub fn scan(&mut self) -> Option<(u8, u8)> {
        let (outputs, _) = self.size();
        let mut first: Option<(u8, u8)> = None;
        for x in 0..outputs {
            let closed = self.scan_output(x);
            if closed == 0 {
                continue;
            }
            let y = closed.trailing_zeros() as u8;
            match first {
                Some((_, best)) if best <= y => {}
                _ => first = Some((x, y)),
            }
        }
        first
    }

    /// Release every output
    pub fn release(&mut self) {
        self.outputs.write(u16::MAX);
        self.outputs.flush();
    }

    /// Give back the ports and the delay
    pub fn into_parts(self) -> (O, I, D) {
        (self.outputs, self.inputs, self.delay)
    }
}

fn width_mask(width: u8) -> u16 {
    match width {
        w if w >= 16 => u16::MAX,
        w => (1u16 << w) - 1,
    }
}
