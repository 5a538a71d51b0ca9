//! Matrix keypad
//!
//! A [`SwitchMatrix`] plus a translation string mapping switch `(x, y)`
//! to the character at index `x + outputs * y`. For the usual 4x4 pad
//! wired with columns on the outputs that is `"123A456B789C*0#D"`.

pub mod matrix;

pub use matrix::{SwitchMatrix, DEFAULT_SETTLE_US};

use cadence_hal::{DelayNs, PortIn, PortOc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Keypad timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeypadConfig {
    /// Settle time after driving an output (µs)
    pub settle_us: u32,
    /// Minimum time between two scans in [`Keypad::poll`] (µs)
    pub poll_interval_us: u64,
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            settle_us: DEFAULT_SETTLE_US,
            poll_interval_us: 50_000,
        }
    }
}

/// Keypad on a switch matrix
pub struct Keypad<'k, O, I, D> {
    matrix: SwitchMatrix<O, I, D>,
    keys: &'k str,
    poll_interval_us: u64,
    last_poll_us: Option<u64>,
    held: Option<char>,
}

impl<'k, O: PortOc, I: PortIn, D: DelayNs> Keypad<'k, O, I, D> {
    /// Create a keypad with `keys` as translation string
    pub fn new(outputs: O, inputs: I, delay: D, keys: &'k str, config: KeypadConfig) -> Self {
        Self {
            matrix: SwitchMatrix::new(outputs, inputs, delay, config.settle_us),
            keys,
            poll_interval_us: config.poll_interval_us,
            last_poll_us: None,
            held: None,
        }
    }

    /// Whether the switch for `key` is closed right now
    ///
    /// Characters missing from the translation string are never pressed.
    pub fn is_pressed(&mut self, key: char) -> bool {
        let columns = self.matrix.size().0 as usize;
        if columns == 0 {
            return false;
        }

        match self.keys.chars().position(|c| c == key) {
            Some(index) => match (u8::try_from(index % columns), u8::try_from(index / columns)) {
                (Ok(x), Ok(y)) => self.matrix.switch_is_closed_at(x, y),
                _ => false,
            },
            None => false,
        }
    }

    /// Key currently held down, if any
    ///
    /// With several keys down, the one earliest in the translation string
    /// wins.
    pub fn pressed(&mut self) -> Option<char> {
        let columns = self.matrix.size().0 as usize;
        let (x, y) = self.matrix.scan()?;
        self.keys.chars().nth(x as usize + columns * y as usize)
    }

    /// Newly pressed key, reported once per press
    ///
    /// Scans at most once per poll interval; calls in between return
    /// `None` without touching the matrix.
    pub fn poll(&mut self, now_us: u64) -> Option<char> {
        if let Some(last) = self.last_poll_us {
            if now_us.saturating_sub(last) < self.poll_interval_us {
                return None;
            }
        }
        self.last_poll_us = Some(now_us);

        let key = self.pressed();
        let fresh = if key != self.held { key } else { None };
        self.held = key;

        #[cfg(feature = "defmt")]
        if let Some(c) = fresh {
            defmt::debug!("keypad: {}", c);
        }

        fresh
    }

    /// Access the underlying matrix
    pub fn matrix(&mut self) -> &mut SwitchMatrix<O, I, D> {
        &mut self.matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_hal_sim::{MatrixInputs, MatrixOutputs, SimClock, SimDelay, SwitchMatrixSim};

    const KEYS: &str = "123A456B789C*0#D";

    fn keypad() -> (
        Keypad<'static, MatrixOutputs, MatrixInputs, SimDelay>,
        SwitchMatrixSim,
    ) {
        let sim = SwitchMatrixSim::new(4, 4);
        let keypad = Keypad::new(
            sim.outputs(),
            sim.inputs(),
            SimDelay::new(SimClock::new()),
            KEYS,
            KeypadConfig::default(),
        );
        (keypad, sim)
    }

    #[test]
    fn test_translation() {
        let (mut keypad, sim) = keypad();
        assert_eq!(keypad.pressed(), None);

        sim.press(1, 2);
        assert_eq!(keypad.pressed(), Some('8'));
        assert!(keypad.is_pressed('8'));
        assert!(!keypad.is_pressed('1'));
        assert!(!keypad.is_pressed('x'));
    }

    #[test]
    fn test_several_keys_pick_lowest_index() {
        let (mut keypad, sim) = keypad();
        sim.press(1, 2);
        sim.press(3, 0);
        assert_eq!(keypad.pressed(), Some('A'));

        sim.press(0, 0);
        assert_eq!(keypad.pressed(), Some('1'));
    }

    #[test]
    fn test_poll_reports_once_per_press() {
        let (mut keypad, sim) = keypad();
        sim.press(3, 3);

        assert_eq!(keypad.poll(0), Some('D'));
        assert_eq!(keypad.poll(50_000), None);

        sim.release_all();
        assert_eq!(keypad.poll(100_000), None);

        sim.press(0, 0);
        assert_eq!(keypad.poll(150_000), Some('1'));
    }

    #[test]
    fn test_poll_is_rate_limited() {
        let (mut keypad, sim) = keypad();
        assert_eq!(keypad.poll(1_000), None);
        let scans = sim.scans();

        sim.press(2, 0);
        assert_eq!(keypad.poll(20_000), None);
        assert_eq!(sim.scans(), scans);

        assert_eq!(keypad.poll(51_000), Some('3'));
        assert!(sim.scans() > scans);
    }

    #[test]
    fn test_key_change_while_held() {
        let (mut keypad, sim) = keypad();
        sim.press(0, 1);
        assert_eq!(keypad.poll(0), Some('4'));

        sim.release(0, 1);
        sim.press(1, 1);
        assert_eq!(keypad.poll(50_000), Some('5'));
    }
}
