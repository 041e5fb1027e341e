//! Simulated INA219 on a draining battery pack.
//!
//! Implements [`embedded_hal::i2c::I2c`] with the chip's pointer-register
//! protocol, so panel-core talks to it exactly as it would to real hardware.
//! Measurement registers are derived from a simple battery model the way the
//! silicon derives them: current from shunt voltage and the calibration
//! register, power from current and bus voltage.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use panel_core::Clock;
use panel_core::ina219::regs::*;

// ---------------------------------------------------------------------------
// Model constants
// ---------------------------------------------------------------------------

/// Shunt resistor in ohms
const SHUNT_OHMS: f64 = 0.1;

/// Pack voltage when full / empty, in mV
const PACK_FULL_MV: f64 = 5950.0;
const PACK_EMPTY_MV: f64 = 4000.0;

/// Usable pack capacity in mA·s (40 mAh)
const PACK_CAPACITY_MAS: f64 = 40.0 * 3600.0;

/// Load current baseline and swing, in mA
const LOAD_BASE_MA: f64 = 150.0;
const LOAD_SWING_MA: f64 = 70.0;

/// Every Nth transaction is NACKed to exercise the caller's retry path
const NACK_EVERY: u32 = 97;

/// Conversion-ready flag in the bus voltage register
const BUS_CONVERSION_READY: u16 = 0b10;

/// Divisor in the chip's current and power register formulas
const CURRENT_SCALE: f64 = 4096.0;
const POWER_SCALE: f64 = 5000.0;

// ---------------------------------------------------------------------------
// Battery model
// ---------------------------------------------------------------------------

/// Battery pack with a load whose current varies slowly over time.
struct PackModel {
    /// Charge drawn so far in mA·s
    drawn_mas: f64,
    /// Simulated time of the last update
    last_ms: Option<u32>,
    /// Simulated seconds since the model started
    elapsed_secs: f64,
}

impl PackModel {
    fn new() -> Self {
        Self {
            drawn_mas: 0.0,
            last_ms: None,
            elapsed_secs: 0.0,
        }
    }

    /// Advance the model to `now_ms`.
    fn advance(&mut self, now_ms: u32) {
        let dt_secs = match self.last_ms {
            Some(last) => now_ms.wrapping_sub(last) as f64 / 1000.0,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        self.drawn_mas += self.load_ma() * dt_secs;
        self.elapsed_secs += dt_secs;
    }

    fn state_of_charge(&self) -> f64 {
        (1.0 - self.drawn_mas / PACK_CAPACITY_MAS).clamp(0.0, 1.0)
    }

    fn load_ma(&self) -> f64 {
        if self.state_of_charge() == 0.0 {
            return 0.0;
        }
        let t = self.elapsed_secs;
        LOAD_BASE_MA + LOAD_SWING_MA * (t / 20.0).sin() + 5.0 * (t / 3.0).cos()
    }

    fn bus_mv(&self) -> f64 {
        PACK_EMPTY_MV + (PACK_FULL_MV - PACK_EMPTY_MV) * self.state_of_charge()
    }
}

// ---------------------------------------------------------------------------
// Simulated sensor
// ---------------------------------------------------------------------------

pub struct SimulatedIna219<C> {
    address: u8,
    clock: C,
    model: PackModel,
    config: u16,
    calibration: u16,
    pointer: u8,
    transactions: u32,
}

impl<C: Clock> SimulatedIna219<C> {
    pub fn new(address: u8, clock: C) -> Self {
        Self {
            address,
            clock,
            model: PackModel::new(),
            config: CONFIG_POWER_ON_DEFAULT,
            calibration: 0,
            pointer: REG_CONFIG,
            transactions: 0,
        }
    }

    /// Shunt voltage register, 10 µV per count
    fn shunt_raw(&self) -> i16 {
        let shunt_mv = self.model.load_ma() * SHUNT_OHMS;
        (shunt_mv / SHUNT_VOLTAGE_LSB_MV as f64) as i16
    }

    /// Bus voltage in register counts, before the status-bit shift
    fn bus_counts(&self) -> u16 {
        (self.model.bus_mv() / BUS_VOLTAGE_LSB_MV as f64) as u16
    }

    fn current_raw(&self) -> i16 {
        (self.shunt_raw() as f64 * self.calibration as f64 / CURRENT_SCALE) as i16
    }

    fn power_raw(&self) -> u16 {
        (self.current_raw() as f64 * self.bus_counts() as f64 / POWER_SCALE).max(0.0) as u16
    }

    fn read_register(&mut self, register: u8) -> Result<u16, ErrorKind> {
        let value = match register {
            REG_CONFIG => self.config,
            REG_SHUNT_VOLTAGE => self.shunt_raw() as u16,
            REG_BUS_VOLTAGE => (self.bus_counts() << BUS_VOLTAGE_SHIFT) | BUS_CONVERSION_READY,
            REG_POWER => self.power_raw(),
            REG_CURRENT => self.current_raw() as u16,
            REG_CALIBRATION => self.calibration,
            _ => return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
        };
        Ok(value)
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), ErrorKind> {
        match register {
            REG_CONFIG if value & CONFIG_RESET != 0 => {
                self.config = CONFIG_POWER_ON_DEFAULT;
                self.calibration = 0;
            }
            REG_CONFIG => self.config = value,
            REG_CALIBRATION => self.calibration = value,
            REG_SHUNT_VOLTAGE | REG_BUS_VOLTAGE | REG_POWER | REG_CURRENT => {}
            _ => return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)),
        }
        Ok(())
    }
}

impl<C> ErrorType for SimulatedIna219<C> {
    type Error = ErrorKind;
}

impl<C: Clock> I2c for SimulatedIna219<C> {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        self.transactions = self.transactions.wrapping_add(1);
        if self.transactions % NACK_EVERY == 0 {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data));
        }

        self.model.advance(self.clock.now_ms());

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => match **bytes {
                    [register] => self.pointer = register,
                    [register, hi, lo] => {
                        self.pointer = register;
                        self.write_register(register, u16::from_be_bytes([hi, lo]))?;
                    }
                    _ => return Err(ErrorKind::Other),
                },
                Operation::Read(buf) => {
                    let bytes = self.read_register(self.pointer)?.to_be_bytes();
                    for (dst, src) in buf.iter_mut().zip(bytes) {
                        *dst = src;
                    }
                }
            }
        }

        Ok(())
    }
}
