//! Battery charge estimate and health classification.

use serde::{Deserialize, Serialize};

/// Percentage of the usable battery voltage window that `bus_mv` sits at.
///
/// Negative results clamp to 0. There is no upper clamp, so a pack charged
/// above `max_mv` reports more than 100.
pub fn battery_percentage(bus_mv: u16, max_mv: u16, min_mv: u16) -> f32 {
    let span = max_mv as f32 - min_mv as f32;
    let percentage = (bus_mv as f32 - min_mv as f32) / span * 100.0;
    if percentage < 0.0 { 0.0 } else { percentage }
}

/// Usable voltage window of the battery pack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryRange {
    /// Fully charged voltage in mV
    pub max_mv: u16,
    /// Empty voltage in mV
    pub min_mv: u16,
}

impl BatteryRange {
    pub const fn new(max_mv: u16, min_mv: u16) -> Self {
        Self { max_mv, min_mv }
    }

    pub fn percentage(&self, bus_mv: u16) -> f32 {
        battery_percentage(bus_mv, self.max_mv, self.min_mv)
    }
}

impl Default for BatteryRange {
    fn default() -> Self {
        Self::new(6000, 4000)
    }
}

/// Health of the battery as seen by the monitor
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatteryState {
    /// No evaluation has happened yet
    #[default]
    Start = 0,
    /// Above the low threshold
    Ok = 1,
    /// At or below the low threshold
    Low = 2,
    /// Unrecognised state, recovers through `Start`
    Fault = 3,
}

impl BatteryState {
    /// Decode a persisted state byte. Anything unknown becomes `Fault`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Start,
            1 => Self::Ok,
            2 => Self::Low,
            _ => Self::Fault,
        }
    }

    pub const fn to_raw(self) -> u8 {
        self as u8
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Ok => "OK",
            Self::Low => "LOW",
            Self::Fault => "FAULT",
        }
    }
}

/// Next battery state given the current one and a fresh percentage reading.
///
/// `Start` always moves to `Ok` without looking at the reading. `Ok` and
/// `Low` follow the threshold, with a reading equal to the threshold counting
/// as low. `Fault` goes back to `Start`.
pub fn evaluate(current: BatteryState, percentage: f32, threshold: f32) -> BatteryState {
    match current {
        BatteryState::Start => BatteryState::Ok,
        BatteryState::Ok | BatteryState::Low => {
            if percentage > threshold {
                BatteryState::Ok
            } else {
                BatteryState::Low
            }
        }
        BatteryState::Fault => BatteryState::Start,
    }
}
