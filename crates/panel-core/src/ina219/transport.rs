//! 16-bit register access on top of an I2C bus.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

/// Capability the INA219 driver needs from the bus: big-endian 16-bit
/// register reads and writes against a 7-bit device address.
///
/// Any [`embedded_hal::i2c::I2c`] implementation gets this for free, so a HAL
/// I2C peripheral (or a shared-bus device wrapping one) can be handed to the
/// driver directly. Timeouts are the bus implementation's business.
pub trait RegisterTransport {
    /// Set the register pointer, then read two bytes, high byte first.
    fn read16(&mut self, address: u8, register: u8) -> Result<u16, ErrorKind>;

    /// Write the register pointer followed by two bytes, high byte first.
    fn write16(&mut self, address: u8, register: u8, value: u16) -> Result<(), ErrorKind>;
}

impl<I: I2c> RegisterTransport for I {
    fn read16(&mut self, address: u8, register: u8) -> Result<u16, ErrorKind> {
        let mut buf = [0u8; 2];
        self.write_read(address, &[register], &mut buf)
            .map_err(|e| e.kind())?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write16(&mut self, address: u8, register: u8, value: u16) -> Result<(), ErrorKind> {
        let [hi, lo] = value.to_be_bytes();
        self.write(address, &[register, hi, lo]).map_err(|e| e.kind())
    }
}
