//! Simulated lines and ports

use std::cell::RefCell;
use std::rc::Rc;

use cadence_hal::{PinIn, PinOut, Port, PortIn, PortOc, PortOut};

#[derive(Debug, Default)]
struct WireState {
    level: bool,
    flushes: usize,
    history: Vec<bool>,
}

/// One digital line
///
/// [`Wire::output`] gives a pin that drives the line on flush,
/// [`Wire::input`] a pin that latches it on refresh. Tying both ends of
/// the same wire to MOSI and MISO gives an SPI loopback.
#[derive(Debug, Clone, Default)]
pub struct Wire {
    state: Rc<RefCell<WireState>>,
}

impl Wire {
    /// Line resting at `level`
    pub fn new(level: bool) -> Self {
        let wire = Self::default();
        wire.state.borrow_mut().level = level;
        wire
    }

    /// Output end
    pub fn output(&self) -> SimOutput {
        SimOutput {
            wire: self.clone(),
            pending: false,
        }
    }

    /// Input end; reads `false` until the first refresh
    pub fn input(&self) -> SimInput {
        SimInput {
            wire: self.clone(),
            latched: false,
        }
    }

    /// Force the level from outside, like a button or a peripheral would
    pub fn set(&self, level: bool) {
        self.state.borrow_mut().level = level;
    }

    /// Current level
    pub fn level(&self) -> bool {
        self.state.borrow().level
    }

    /// Number of flushes through an output end
    pub fn flushes(&self) -> usize {
        self.state.borrow().flushes
    }

    /// Every level committed by a flush, in order
    pub fn history(&self) -> Vec<bool> {
        self.state.borrow().history.clone()
    }

    /// Number of level changes committed by flushes
    pub fn transitions(&self) -> usize {
        self.state
            .borrow()
            .history
            .windows(2)
            .filter(|pair| pair[0] != pair[1])
            .count()
    }
}

/// Driving end of a [`Wire`]
#[derive(Debug)]
pub struct SimOutput {
    wire: Wire,
    pending: bool,
}

impl PinOut for SimOutput {
    fn write(&mut self, high: bool) {
        self.pending = high;
    }

    fn flush(&mut self) {
        let mut state = self.wire.state.borrow_mut();
        state.level = self.pending;
        state.flushes += 1;
        state.history.push(self.pending);
    }
}

/// Sampling end of a [`Wire`]
#[derive(Debug)]
pub struct SimInput {
    wire: Wire,
    latched: bool,
}

impl PinIn for SimInput {
    fn read(&self) -> bool {
        self.latched
    }

    fn refresh(&mut self) {
        self.latched = self.wire.level();
    }
}

/// Output port that records every flushed value
///
/// Clones share the record.
#[derive(Debug, Clone)]
pub struct RecordingPort {
    width: u8,
    pending: u16,
    flushed: Rc<RefCell<Vec<u16>>>,
}

impl RecordingPort {
    /// Port with `width` pins
    pub fn new(width: u8) -> Self {
        Self {
            width,
            pending: 0,
            flushed: Rc::default(),
        }
    }

    /// Every flushed value, in order
    pub fn values(&self) -> Vec<u16> {
        self.flushed.borrow().clone()
    }

    /// Most recent flushed value
    pub fn last(&self) -> Option<u16> {
        self.flushed.borrow().last().copied()
    }
}

impl Port for RecordingPort {
    fn number_of_pins(&self) -> u8 {
        self.width
    }
}

impl PortOut for RecordingPort {
    fn write(&mut self, value: u16) {
        self.pending = value;
    }

    fn flush(&mut self) {
        self.flushed.borrow_mut().push(self.pending);
    }
}

#[derive(Debug)]
struct MatrixState {
    outputs: u8,
    inputs: u8,
    driven: u16,
    closed: Vec<(u8, u8)>,
    scans: usize,
}

/// Switch matrix between an open-collector output port and an input port
///
/// Inputs have pull-ups: input `y` reads low only while some output `x`
/// is driven low and switch `(x, y)` is closed.
#[derive(Debug, Clone)]
pub struct SwitchMatrixSim {
    state: Rc<RefCell<MatrixState>>,
}

impl SwitchMatrixSim {
    /// Matrix with `outputs` driven lines and `inputs` sensed lines
    pub fn new(outputs: u8, inputs: u8) -> Self {
        Self {
            state: Rc::new(RefCell::new(MatrixState {
                outputs,
                inputs,
                driven: u16::MAX,
                closed: Vec::new(),
                scans: 0,
            })),
        }
    }

    /// Output port end
    pub fn outputs(&self) -> MatrixOutputs {
        MatrixOutputs {
            matrix: self.clone(),
            pending: u16::MAX,
            latched: u16::MAX,
        }
    }

    /// Input port end
    pub fn inputs(&self) -> MatrixInputs {
        MatrixInputs {
            matrix: self.clone(),
            latched: u16::MAX,
        }
    }

    /// Close switch `(x, y)`
    pub fn press(&self, x: u8, y: u8) {
        let mut state = self.state.borrow_mut();
        if !state.closed.contains(&(x, y)) {
            state.closed.push((x, y));
        }
    }

    /// Open switch `(x, y)`
    pub fn release(&self, x: u8, y: u8) {
        self.state.borrow_mut().closed.retain(|&key| key != (x, y));
    }

    /// Open every switch
    pub fn release_all(&self) {
        self.state.borrow_mut().closed.clear();
    }

    /// Number of output flushes so far
    pub fn scans(&self) -> usize {
        self.state.borrow().scans
    }

    /// Value currently driven on the outputs
    pub fn driven(&self) -> u16 {
        self.state.borrow().driven
    }

    fn sense(&self) -> u16 {
        let state = self.state.borrow();
        let mask = width_mask(state.inputs);
        let pulled_low = state
            .closed
            .iter()
            .filter(|&&(x, _)| state.driven & (1 << x) == 0)
            .fold(0u16, |acc, &(_, y)| acc | (1 << y));
        !pulled_low & mask
    }
}

fn width_mask(width: u8) -> u16 {
    if width >= 16 {
        u16::MAX
    } else {
        (1u16 << width) - 1
    }
}

/// Open-collector output end of a [`SwitchMatrixSim`]
#[derive(Debug)]
pub struct MatrixOutputs {
    matrix: SwitchMatrixSim,
    pending: u16,
    latched: u16,
}

impl Port for MatrixOutputs {
    fn number_of_pins(&self) -> u8 {
        self.matrix.state.borrow().outputs
    }
}

impl PortOut for MatrixOutputs {
    fn write(&mut self, value: u16) {
        self.pending = value;
    }

    fn flush(&mut self) {
        let mut state = self.matrix.state.borrow_mut();
        state.driven = self.pending | !width_mask(state.outputs);
        state.scans += 1;
    }
}

impl PortIn for MatrixOutputs {
    fn read(&self) -> u16 {
        self.latched
    }

    fn refresh(&mut self) {
        self.latched = self.matrix.driven();
    }
}

impl PortOc for MatrixOutputs {}

/// Input end of a [`SwitchMatrixSim`]
#[derive(Debug)]
pub struct MatrixInputs {
    matrix: SwitchMatrixSim,
    latched: u16,
}

impl Port for MatrixInputs {
    fn number_of_pins(&self) -> u8 {
        self.matrix.state.borrow().inputs
    }
}

impl PortIn for MatrixInputs {
    fn read(&self) -> u16 {
        self.latched
    }

    fn refresh(&mut self) {
        self.latched = self.matrix.sense();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_two_phase() {
        let wire = Wire::new(false);
        let mut out = wire.output();
        let mut input = wire.input();

        out.write(true);
        assert!(!wire.level());
        out.flush();
        assert!(wire.level());

        assert!(!input.read());
        input.refresh();
        assert!(input.read());
        assert_eq!(wire.history(), vec![true]);
    }

    #[test]
    fn test_recording_port_shares_log() {
        let port = RecordingPort::new(4);
        let mut handle = port.clone();
        handle.write(3);
        handle.flush();
        handle.write(5);
        assert_eq!(port.values(), vec![3]);
        handle.flush();
        assert_eq!(port.last(), Some(5));
    }

    #[test]
    fn test_matrix_senses_driven_column() {
        let matrix = SwitchMatrixSim::new(3, 2);
        let mut outputs = matrix.outputs();
        let mut inputs = matrix.inputs();
        matrix.press(1, 1);

        outputs.write(!(1 << 0));
        outputs.flush();
        inputs.refresh();
        assert_eq!(inputs.read(), 0b11);

        outputs.write(!(1 << 1));
        outputs.flush();
        inputs.refresh();
        assert_eq!(inputs.read(), 0b01);

        matrix.release(1, 1);
        inputs.refresh();
        assert_eq!(inputs.read(), 0b11);
        assert_eq!(matrix.scans(), 2);
    }
}
