//! Recording SPI bus

use std::cell::RefCell;
use std::rc::Rc;

use cadence_hal::{SpiBus, SpiError};

/// SPI bus that records every transfer and answers with a fixed byte
///
/// Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingSpi {
    frames: Rc<RefCell<Vec<Vec<u8>>>>,
    response: u8,
}

impl RecordingSpi {
    /// Bus answering zeros
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus answering `response` for every byte
    pub fn with_response(response: u8) -> Self {
        Self {
            response,
            ..Self::default()
        }
    }

    /// Bytes sent by each transfer, in order
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.borrow().clone()
    }

    /// Forget recorded transfers
    pub fn clear(&self) {
        self.frames.borrow_mut().clear();
    }
}

impl SpiBus for RecordingSpi {
    fn write_and_read(
        &mut self,
        n: usize,
        data_out: Option<&[u8]>,
        data_in: Option<&mut [u8]>,
    ) -> Result<(), SpiError> {
        let out = match data_out {
            Some(data) => data.get(..n).ok_or(SpiError::BufferTooShort)?.to_vec(),
            None => vec![0; n],
        };
        if let Some(input) = data_in {
            input
                .get_mut(..n)
                .ok_or(SpiError::BufferTooShort)?
                .fill(self.response);
        }
        self.frames.borrow_mut().push(out);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_frames() {
        let bus = RecordingSpi::with_response(0xA5);
        let mut handle = bus.clone();
        let mut reply = [0u8; 2];

        handle
            .write_and_read(2, Some(&[1u8, 2][..]), Some(&mut reply[..]))
            .unwrap();
        handle.write_and_read(1, None, None).unwrap();

        assert_eq!(reply, [0xA5, 0xA5]);
        assert_eq!(bus.frames(), vec![vec![1, 2], vec![0]]);
    }

    #[test]
    fn test_short_buffer_records_nothing() {
        let mut bus = RecordingSpi::new();
        assert_eq!(
            bus.write_and_read(3, Some(&[1u8][..]), None),
            Err(SpiError::BufferTooShort)
        );
        assert!(bus.frames().is_empty());
    }
}
