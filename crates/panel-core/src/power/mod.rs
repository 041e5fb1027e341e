//! Derived power quantities: energy, smoothed power and battery health

pub mod battery;
pub mod energy;
pub mod filter;

pub use battery::{BatteryRange, BatteryState, battery_percentage, evaluate};
pub use energy::EnergyAccumulator;
pub use filter::{AverageMode, DEFAULT_WINDOW, RollingAverage};
