//! INA219 high-side current / power monitor driver

mod calibration;
mod device;
pub mod regs;
mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use calibration::{
    AdcSetting, BusVoltageRange, CalibrationPreset, CalibrationProfile, OperatingMode, ShuntGain,
};
pub use device::Ina219;
pub use transport::RegisterTransport;
