//! Simulated I2C bus with an echoing slave
//!
//! The slave follows SCL/SDA edge by edge: start and stop conditions,
//! address matching, ACK on every accepted byte. Bytes written to it are
//! queued and handed back, in order, by later reads; an empty queue reads
//! as `0xFF`, like a released line.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use cadence_hal::{PinIn, PinOc, PinOut};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Line {
    Scl,
    Sda,
}

#[derive(Debug)]
struct Slave {
    address: u8,
    master_scl: bool,
    master_sda: bool,
    slave_sda: bool,
    stuck_low: bool,
    active: bool,
    skip_fall: bool,
    addressing: bool,
    receiving: bool,
    read_mode: bool,
    bit: u8,
    shift: u8,
    ack: bool,
    tx_byte: u8,
    master_acked: bool,
    data_index: usize,
    nack_data_at: Option<usize>,
    queue: VecDeque<u8>,
    received: Vec<u8>,
    master_acks: Vec<bool>,
    starts: usize,
    stops: usize,
}

impl Slave {
    fn sda(&self) -> bool {
        self.master_sda && self.slave_sda && !self.stuck_low
    }

    fn level(&self, line: Line) -> bool {
        match line {
            Line::Scl => self.master_scl,
            Line::Sda => self.sda(),
        }
    }

    fn drive(&mut self, line: Line, level: bool) {
        match line {
            Line::Scl => {
                if self.master_scl == level {
                    return;
                }
                self.master_scl = level;
                if level {
                    self.scl_rise();
                } else {
                    self.scl_fall();
                }
            }
            Line::Sda => {
                let before = self.sda();
                self.master_sda = level;
                let after = self.sda();
                if self.master_scl && before != after {
                    if after {
                        self.stop_condition();
                    } else {
                        self.start_condition();
                    }
                }
            }
        }
    }

    fn start_condition(&mut self) {
        self.starts += 1;
        self.active = true;
        self.skip_fall = true;
        self.addressing = true;
        self.receiving = true;
        self.bit = 0;
        self.shift = 0;
        self.data_index = 0;
        self.slave_sda = true;
    }

    fn stop_condition(&mut self) {
        self.stops += 1;
        self.active = false;
        self.slave_sda = true;
    }

    fn scl_rise(&mut self) {
        if !self.active {
            return;
        }
        self.skip_fall = false;
        if self.bit < 8 {
            if self.receiving {
                self.shift = (self.shift << 1) | u8::from(self.sda());
            }
        } else if !self.receiving {
            self.master_acked = !self.sda();
            self.master_acks.push(self.master_acked);
        }
    }

    fn scl_fall(&mut self) {
        if !self.active {
            return;
        }
        if self.skip_fall {
            self.skip_fall = false;
            return;
        }

        match self.bit {
            0..=6 => {
                self.bit += 1;
                if !self.receiving {
                    self.slave_sda = self.tx_byte & (0x80 >> self.bit) != 0;
                }
            }
            7 => {
                self.bit = 8;
                if self.receiving {
                    self.ack = self.accept(self.shift);
                    self.slave_sda = !self.ack;
                } else {
                    self.slave_sda = true;
                }
            }
            _ => {
                self.bit = 0;
                self.shift = 0;
                self.slave_sda = true;
                if self.receiving {
                    if !self.ack {
                        self.active = false;
                    } else if self.addressing {
                        self.addressing = false;
                        if self.read_mode {
                            self.receiving = false;
                            self.load_next();
                        }
                    }
                } else if self.master_acked {
                    self.load_next();
                } else {
                    self.active = false;
                }
            }
        }
    }

    fn accept(&mut self, byte: u8) -> bool {
        if self.addressing {
            self.read_mode = byte & 1 != 0;
            return byte >> 1 == self.address;
        }

        let index = self.data_index;
        self.data_index += 1;
        if self.nack_data_at == Some(index) {
            return false;
        }
        self.received.push(byte);
        self.queue.push_back(byte);
        true
    }

    fn load_next(&mut self) {
        self.tx_byte = self.queue.pop_front().unwrap_or(0xFF);
        self.slave_sda = self.tx_byte & 0x80 != 0;
    }
}

/// Simulated bus segment with one slave device
///
/// Clones share the bus.
#[derive(Debug, Clone)]
pub struct I2cSlaveSim {
    state: Rc<RefCell<Slave>>,
}

impl I2cSlaveSim {
    /// Bus with a slave answering to the 7-bit `address`
    pub fn new(address: u8) -> Self {
        Self {
            state: Rc::new(RefCell::new(Slave {
                address,
                master_scl: true,
                master_sda: true,
                slave_sda: true,
                stuck_low: false,
                active: false,
                skip_fall: false,
                addressing: false,
                receiving: true,
                read_mode: false,
                bit: 0,
                shift: 0,
                ack: false,
                tx_byte: 0,
                master_acked: false,
                data_index: 0,
                nack_data_at: None,
                queue: VecDeque::new(),
                received: Vec::new(),
                master_acks: Vec::new(),
                starts: 0,
                stops: 0,
            })),
        }
    }

    /// Master's clock pin
    pub fn scl(&self) -> I2cSimPin {
        self.pin(Line::Scl)
    }

    /// Master's data pin
    pub fn sda(&self) -> I2cSimPin {
        self.pin(Line::Sda)
    }

    fn pin(&self, line: Line) -> I2cSimPin {
        I2cSimPin {
            bus: self.clone(),
            line,
            pending: true,
            latched: true,
        }
    }

    /// Refuse the data byte with this index in every write transaction
    pub fn nack_data_at(&self, index: Option<usize>) {
        self.state.borrow_mut().nack_data_at = index;
    }

    /// Hold SDA low from outside, like a hung device would
    pub fn hold_sda_low(&self, held: bool) {
        self.state.borrow_mut().stuck_low = held;
    }

    /// Data bytes the slave accepted, in order
    pub fn received(&self) -> Vec<u8> {
        self.state.borrow().received.clone()
    }

    /// Acknowledge bits sent by the master while reading; `true` is ACK
    pub fn master_acks(&self) -> Vec<bool> {
        self.state.borrow().master_acks.clone()
    }

    /// Number of start conditions seen
    pub fn starts(&self) -> usize {
        self.state.borrow().starts
    }

    /// Number of stop conditions seen
    pub fn stops(&self) -> usize {
        self.state.borrow().stops
    }

    /// Whether both lines are currently high
    pub fn is_idle(&self) -> bool {
        let state = self.state.borrow();
        state.master_scl && state.sda()
    }
}

/// Open-drain master pin on an [`I2cSlaveSim`] bus
#[derive(Debug)]
pub struct I2cSimPin {
    bus: I2cSlaveSim,
    line: Line,
    pending: bool,
    latched: bool,
}

impl PinOut for I2cSimPin {
    fn write(&mut self, high: bool) {
        self.pending = high;
    }

    fn flush(&mut self) {
        self.bus.state.borrow_mut().drive(self.line, self.pending);
    }
}

impl PinIn for I2cSimPin {
    fn read(&self) -> bool {
        self.latched
    }

    fn refresh(&mut self) {
        self.latched = self.bus.state.borrow().level(self.line);
    }
}

impl PinOc for I2cSimPin {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Clock one bit by hand: SCL low, SDA, SCL high; returns SDA as seen
    /// while SCL is high
    fn clock_bit(scl: &mut I2cSimPin, sda: &mut I2cSimPin, bit: bool) -> bool {
        scl.write_flush(false);
        sda.write_flush(bit);
        scl.write_flush(true);
        sda.refresh_read()
    }

    fn start(scl: &mut I2cSimPin, sda: &mut I2cSimPin) {
        sda.write_flush(true);
        scl.write_flush(true);
        sda.write_flush(false);
        scl.write_flush(false);
    }

    #[test]
    fn test_slave_acks_own_address() {
        let bus = I2cSlaveSim::new(0x42);
        let mut scl = bus.scl();
        let mut sda = bus.sda();

        start(&mut scl, &mut sda);
        let address = 0x42 << 1;
        for i in (0..8).rev() {
            clock_bit(&mut scl, &mut sda, (address >> i) & 1 != 0);
        }
        let ack = !clock_bit(&mut scl, &mut sda, true);
        assert!(ack);
        assert_eq!(bus.starts(), 1);
    }

    #[test]
    fn test_slave_ignores_other_address() {
        let bus = I2cSlaveSim::new(0x42);
        let mut scl = bus.scl();
        let mut sda = bus.sda();

        start(&mut scl, &mut sda);
        let address = 0x43 << 1;
        for i in (0..8).rev() {
            clock_bit(&mut scl, &mut sda, (address >> i) & 1 != 0);
        }
        let ack = !clock_bit(&mut scl, &mut sda, true);
        assert!(!ack);
    }

    #[test]
    fn test_stuck_line_is_not_idle() {
        let bus = I2cSlaveSim::new(0x10);
        assert!(bus.is_idle());
        bus.hold_sda_low(true);
        assert!(!bus.is_idle());
    }
}
