//! In-memory INA219 register file used by the unit tests.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use super::regs::{ALL_REGISTERS, DEFAULT_ADDRESS};

/// Register file with INA219 pointer-register semantics.
///
/// A write of one byte sets the register pointer, a write of three bytes sets
/// the pointer and stores the big-endian payload, a read returns the register
/// under the pointer. It does not model conversions: tests put raw words in
/// with [`FakeIna219::set_register`] and read back what the driver wrote.
pub(crate) struct FakeIna219 {
    address: u8,
    registers: [u16; ALL_REGISTERS.len()],
    pointer: u8,
    failing: u8,
    last_write: Option<[u8; 3]>,
}

impl FakeIna219 {
    pub(crate) fn new() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            registers: [0; ALL_REGISTERS.len()],
            pointer: 0,
            failing: 0,
            last_write: None,
        }
    }

    pub(crate) fn set_register(&mut self, register: u8, value: u16) {
        self.registers[register as usize] = value;
    }

    pub(crate) fn register(&self, register: u8) -> u16 {
        self.registers[register as usize]
    }

    pub(crate) fn last_write(&self) -> Option<[u8; 3]> {
        self.last_write
    }

    /// Every transfer touching `register` is NACKed until cleared.
    pub(crate) fn fail_register(&mut self, register: u8) {
        self.failing |= 1 << register;
    }

    pub(crate) fn clear_failures(&mut self) {
        self.failing = 0;
    }

    fn check(&self, register: u8) -> Result<(), ErrorKind> {
        if register as usize >= ALL_REGISTERS.len() || self.failing & (1 << register) != 0 {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }
        Ok(())
    }
}

impl ErrorType for FakeIna219 {
    type Error = ErrorKind;
}

impl I2c for FakeIna219 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    let Some((&register, payload)) = bytes.split_first() else {
                        continue;
                    };
                    self.check(register)?;
                    self.pointer = register;
                    if let [hi, lo] = payload {
                        self.registers[register as usize] = u16::from_be_bytes([*hi, *lo]);
                        self.last_write = Some([register, *hi, *lo]);
                    }
                }
                Operation::Read(buf) => {
                    self.check(self.pointer)?;
                    let bytes = self.registers[self.pointer as usize].to_be_bytes();
                    for (dst, src) in buf.iter_mut().zip(bytes) {
                        *dst = src;
                    }
                }
            }
        }

        Ok(())
    }
}
