//! INA219 register map and configuration register bit fields.
//!
//! Values follow the TI INA219 datasheet (SBOS448), section 8.6.

// =============================================================================
// I2C Address
// =============================================================================

/// Default 7-bit address with A0 and A1 tied to GND
pub const DEFAULT_ADDRESS: u8 = 0x40;

// =============================================================================
// Register Addresses
// =============================================================================

pub const REG_CONFIG: u8 = 0x00;
pub const REG_SHUNT_VOLTAGE: u8 = 0x01;
pub const REG_BUS_VOLTAGE: u8 = 0x02;
pub const REG_POWER: u8 = 0x03;
pub const REG_CURRENT: u8 = 0x04;
pub const REG_CALIBRATION: u8 = 0x05;

/// Every register, in address order
pub const ALL_REGISTERS: [u8; 6] = [
    REG_CONFIG,
    REG_SHUNT_VOLTAGE,
    REG_BUS_VOLTAGE,
    REG_POWER,
    REG_CURRENT,
    REG_CALIBRATION,
];

// =============================================================================
// Configuration Register Fields
// =============================================================================

/// Writing this bit resets every register to its power-on value
pub const CONFIG_RESET: u16 = 0x8000;

/// Power-on value of the configuration register
pub const CONFIG_POWER_ON_DEFAULT: u16 = 0x399F;

pub const CONFIG_BUS_RANGE_SHIFT: u16 = 13;
pub const CONFIG_GAIN_SHIFT: u16 = 11;
pub const CONFIG_BUS_ADC_SHIFT: u16 = 7;
pub const CONFIG_SHUNT_ADC_SHIFT: u16 = 3;

pub const CONFIG_MODE_MASK: u16 = 0x0007;

// =============================================================================
// Fixed LSBs
// =============================================================================

/// The bus voltage register drops its low three status bits (CNVR, OVF, reserved)
pub const BUS_VOLTAGE_SHIFT: u16 = 3;
/// Bus voltage LSB after the shift, in millivolts
pub const BUS_VOLTAGE_LSB_MV: u16 = 4;
/// Shunt voltage LSB in millivolts (10 µV)
pub const SHUNT_VOLTAGE_LSB_MV: f32 = 0.01;
