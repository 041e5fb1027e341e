//! Hardware-independent core library for panel-rs
//!
//! This crate contains all platform-agnostic logic for the panel tester's
//! power monitoring: register-level access to an INA219 bus-voltage /
//! shunt-current sensor, calibration-dependent unit conversion, energy
//! integration, a rolling power average and the battery health classifier.
//!
//! It is `#![no_std]` so it compiles on both embedded targets and desktop
//! hosts (for the simulator and tests). The I2C bus and the millisecond clock
//! are supplied by the caller.

#![no_std]

pub mod clock;
pub mod config;
pub mod error;
pub mod ina219;
pub mod monitor;
pub mod power;

pub use clock::Clock;
pub use config::MonitorConfig;
pub use error::{ConfigError, Error};
pub use ina219::{CalibrationPreset, CalibrationProfile, Ina219, OperatingMode, RegisterTransport};
pub use monitor::{PowerMonitor, PowerSnapshot, SharedMonitor, poll_shared};
pub use power::{AverageMode, BatteryRange, BatteryState, EnergyAccumulator, RollingAverage};
