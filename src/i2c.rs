//! Register transport over an embedded-hal I2C bus.
//!
//! The sensor uses 16-bit big-endian register addresses; multi-byte
//! values are big-endian as well.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::traits::{RegWidth, RegisterBus};

/// Default 7-bit bus address of the sensor.
pub const DEFAULT_ADDRESS: u8 = 0x1a;

/// [`RegisterBus`] over any embedded-hal I2C implementation.
pub struct CciBus<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> CciBus<I> {
    /// Talk to the sensor at [`DEFAULT_ADDRESS`].
    pub const fn new(i2c: I) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    /// Talk to the sensor at a specific 7-bit address.
    pub const fn with_address(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Give back the bus.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> RegisterBus for CciBus<I> {
    fn read(&mut self, address: u16, width: RegWidth) -> Result<u32, ErrorKind> {
        let mut data = [0u8; 2];
        let buf = data.get_mut(..width.len()).ok_or(ErrorKind::Other)?;
        self.i2c
            .write_read(self.address, &address.to_be_bytes(), buf)
            .map_err(|e| e.kind())?;
        Ok(buf.iter().fold(0, |acc, &b| (acc << 8) | u32::from(b)))
    }

    fn write(&mut self, address: u16, width: RegWidth, value: u32) -> Result<(), ErrorKind> {
        let [a_hi, a_lo] = address.to_be_bytes();
        let [_, _, v_hi, v_lo] = value.to_be_bytes();
        match width {
            RegWidth::Byte => self.i2c.write(self.address, &[a_hi, a_lo, v_lo]),
            RegWidth::Word => self.i2c.write(self.address, &[a_hi, a_lo, v_hi, v_lo]),
        }
        .map_err(|e| e.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{ErrorType, NoAcknowledgeSource, Operation};
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeI2c {
        memory: HashMap<u16, u8>,
        pointer: u16,
        transfers: Vec<(u8, Vec<u8>)>,
        nack: bool,
    }

    impl ErrorType for FakeI2c {
        type Error = ErrorKind;
    }

    impl I2c for FakeI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.nack {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        self.transfers.push((address, bytes.to_vec()));
                        if let [hi, lo, data @ ..] = *bytes {
                            self.pointer = u16::from_be_bytes([*hi, *lo]);
                            for (offset, value) in (0u16..).zip(data) {
                                self.memory.insert(self.pointer + offset, *value);
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for (offset, slot) in (0u16..).zip(buf.iter_mut()) {
                            *slot = self
                                .memory
                                .get(&(self.pointer + offset))
                                .copied()
                                .unwrap_or_default();
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn test_word_write_is_big_endian() {
        let mut bus = CciBus::new(FakeI2c::default());
        bus.write(0x0340, RegWidth::Word, 0x1234)
            .expect("write should succeed");

        let i2c = bus.release();
        assert_eq!(i2c.transfers, vec![(0x1a, vec![0x03, 0x40, 0x12, 0x34])]);
    }

    #[test]
    fn test_byte_write() {
        let mut bus = CciBus::with_address(FakeI2c::default(), 0x10);
        bus.write(0x0100, RegWidth::Byte, 0x01)
            .expect("write should succeed");

        let i2c = bus.release();
        assert_eq!(i2c.transfers, vec![(0x10, vec![0x01, 0x00, 0x01])]);
    }

    #[test]
    fn test_read_chip_id() {
        let mut i2c = FakeI2c::default();
        i2c.memory.insert(0x0016, 0x07);
        i2c.memory.insert(0x0017, 0x08);
        let mut bus = CciBus::new(i2c);

        assert_eq!(bus.read(0x0016, RegWidth::Word), Ok(0x0708));
        assert_eq!(bus.read(0x0017, RegWidth::Byte), Ok(0x08));
    }

    #[test]
    fn test_error_kind_propagates() {
        let i2c = FakeI2c {
            nack: true,
            ..FakeI2c::default()
        };
        let mut bus = CciBus::new(i2c);
        assert_eq!(
            bus.read(0x0016, RegWidth::Word),
            Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
        );
    }
}
