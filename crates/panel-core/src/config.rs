//! Monitor configuration
//!
//! A [`MonitorConfig`] describes one sensor and the battery it watches. It is
//! serde-serializable so firmware can keep it in flash as a postcard blob and
//! the simulator can build it in code.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ina219::CalibrationPreset;
use crate::ina219::regs::DEFAULT_ADDRESS;
use crate::power::{AverageMode, BatteryRange};

/// Largest valid 7-bit I2C address
const MAX_I2C_ADDRESS: u8 = 0x7F;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MonitorConfig {
    /// 7-bit I2C address of the INA219
    pub address: u8,
    /// Measurement range applied at start-up
    pub preset: CalibrationPreset,
    /// Fully charged battery voltage in mV
    pub battery_max_mv: u16,
    /// Empty battery voltage in mV
    pub battery_min_mv: u16,
    /// Battery percentage at or below which the battery is reported `Low`
    pub low_battery_threshold_percent: f32,
    /// How the rolling power average treats a partly filled window
    pub average_mode: AverageMode,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS,
            preset: CalibrationPreset::default(),
            battery_max_mv: 6000,
            battery_min_mv: 4000,
            low_battery_threshold_percent: 20.0,
            average_mode: AverageMode::default(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address > MAX_I2C_ADDRESS {
            return Err(ConfigError::InvalidAddress(self.address));
        }
        if self.battery_max_mv <= self.battery_min_mv {
            return Err(ConfigError::InvalidBatteryRange {
                max_mv: self.battery_max_mv,
                min_mv: self.battery_min_mv,
            });
        }
        if !(0.0..=100.0).contains(&self.low_battery_threshold_percent) {
            return Err(ConfigError::InvalidThreshold);
        }
        Ok(())
    }

    pub fn battery_range(&self) -> BatteryRange {
        BatteryRange::new(self.battery_max_mv, self.battery_min_mv)
    }

    /// Encode into `buf`, returning the used prefix.
    pub fn to_postcard<'a>(&self, buf: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        Ok(postcard::to_slice(self, buf)?)
    }

    /// Decode and validate a config previously written with [`Self::to_postcard`].
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes)?;
        config.validate()?;
        Ok(config)
    }
}
