//! Error types shared by the driver, the monitor and the configuration layer

use embedded_hal::i2c::ErrorKind;
use thiserror_no_std::Error;

/// Errors raised while talking to the INA219 or converting its readings.
///
/// Nothing here is fatal: a caller that sees [`Error::Transport`] is expected
/// to retry the whole polling iteration on its own schedule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The I2C transaction for `register` failed (NACK, arbitration loss, bus fault).
    #[error("I2C transfer on register {register:#04x} failed: {kind}")]
    Transport { register: u8, kind: ErrorKind },
    /// A current or power conversion was requested before any calibration profile was applied.
    #[error("no calibration profile is active")]
    NotCalibrated,
    /// The calibration register was written but the configuration write failed.
    /// The device no longer reports an active profile.
    #[error("calibration only partially applied, configuration write failed: {kind}")]
    PartialCalibration { kind: ErrorKind },
    /// A custom calibration profile had a zero calibration value, divisor or multiplier.
    #[error("calibration profile has a zero scale factor")]
    InvalidProfile,
    /// A [`crate::MonitorConfig`] failed validation before the monitor was built.
    #[error("invalid monitor configuration: {0}")]
    Config(ConfigError),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Errors raised when validating or (de)serialising a [`crate::MonitorConfig`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("I2C address {0:#04x} is not a 7-bit address")]
    InvalidAddress(u8),
    #[error("battery range is empty: full {max_mv} mV must be above empty {min_mv} mV")]
    InvalidBatteryRange { max_mv: u16, min_mv: u16 },
    #[error("low battery threshold must be within 0..=100 percent")]
    InvalidThreshold,
    #[error("config encoding failed: {0}")]
    Encoding(postcard::Error),
}

impl From<postcard::Error> for ConfigError {
    fn from(e: postcard::Error) -> Self {
        Self::Encoding(e)
    }
}
