use log::{debug, error, info, warn};

use super::calibration::{CalibrationProfile, OperatingMode};
use super::regs::*;
use super::transport::RegisterTransport;
use crate::error::Error;
use crate::power::battery::{BatteryRange, battery_percentage};

/// INA219 bus-voltage / shunt-current monitor.
///
/// Owns the register transport, the device's 7-bit address and the active
/// [`CalibrationProfile`]. Every call is a blocking transfer on the bus; no
/// retries are made, a failed transfer is returned as [`Error::Transport`].
///
/// Bus voltage, shunt voltage and the raw current register have fixed LSBs
/// and can be read at any time. Current in mA and power in mW depend on the
/// calibration and return [`Error::NotCalibrated`] until a profile is applied.
pub struct Ina219<T> {
    /// Bus the sensor lives on
    transport: T,
    /// 7-bit I2C address
    address: u8,
    /// Profile last written to the chip, if the write fully succeeded
    calibration: Option<CalibrationProfile>,
}

impl<T> Ina219<T>
where
    T: RegisterTransport,
{
    /// Create a driver for the sensor at `address`. Nothing is written to the
    /// chip until [`Self::apply_calibration`] or [`Self::reset`] is called.
    pub fn new(transport: T, address: u8) -> Self {
        Self {
            transport,
            address,
            calibration: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// The active calibration profile, if any
    pub fn calibration(&self) -> Option<&CalibrationProfile> {
        self.calibration.as_ref()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back to the caller
    pub fn release(self) -> T {
        self.transport
    }

    // =========================================================================
    // Private Register Helpers
    // =========================================================================

    fn read_register(&mut self, register: u8) -> Result<u16, Error> {
        self.transport
            .read16(self.address, register)
            .map_err(|kind| {
                error!("INA219 read of register {:#04x} failed: {:?}", register, kind);
                Error::Transport { register, kind }
            })
    }

    fn write_register(&mut self, register: u8, value: u16) -> Result<(), Error> {
        self.transport
            .write16(self.address, register, value)
            .map_err(|kind| {
                error!(
                    "INA219 write of {:#06x} to register {:#04x} failed: {:?}",
                    value, register, kind
                );
                Error::Transport { register, kind }
            })
    }

    fn active_profile(&self) -> Result<CalibrationProfile, Error> {
        self.calibration.ok_or(Error::NotCalibrated)
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Write `profile` to the chip and make it the active profile.
    ///
    /// The calibration register is written first, then the configuration
    /// word. If the calibration write fails nothing has changed and the
    /// previous profile stays active. If the configuration write fails the
    /// chip is half-configured: the driver drops its active profile and
    /// returns [`Error::PartialCalibration`].
    pub fn apply_calibration(&mut self, profile: CalibrationProfile) -> Result<(), Error> {
        self.write_register(REG_CALIBRATION, profile.calibration_value())?;

        if let Err(kind) = self
            .transport
            .write16(self.address, REG_CONFIG, profile.config_word())
        {
            warn!(
                "INA219 calibration {} written but config write failed: {:?}",
                profile.calibration_value(),
                kind
            );
            self.calibration = None;
            return Err(Error::PartialCalibration { kind });
        }

        info!(
            "INA219 at {:#04x} calibrated: cal={} divisor={} counts/mA multiplier={} mW/count config={:#06x}",
            self.address,
            profile.calibration_value(),
            profile.current_divisor_ma(),
            profile.power_multiplier_mw(),
            profile.config_word()
        );
        self.calibration = Some(profile);
        Ok(())
    }

    /// Reset every register to its power-on value.
    ///
    /// The chip comes back uncalibrated, so the active profile is dropped.
    /// The chip needs a moment before it accepts the next write; waiting is up
    /// to the caller.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.write_register(REG_CONFIG, CONFIG_RESET)?;
        self.calibration = None;
        info!("INA219 at {:#04x} reset", self.address);
        Ok(())
    }

    /// Read the raw configuration register
    pub fn read_config(&mut self) -> Result<u16, Error> {
        self.read_register(REG_CONFIG)
    }

    /// Change only the MODE bits of the configuration register.
    pub fn set_power_mode(&mut self, mode: OperatingMode) -> Result<(), Error> {
        let config = self.read_config()?;
        let config = (config & !CONFIG_MODE_MASK) | mode.to_register();
        self.write_register(REG_CONFIG, config)?;
        info!("INA219 power mode set to {:?}", mode);
        Ok(())
    }

    // =========================================================================
    // Measurements
    // =========================================================================

    /// Bus voltage in millivolts, always a multiple of 4
    pub fn read_bus_voltage_mv(&mut self) -> Result<u16, Error> {
        let raw = self.read_register(REG_BUS_VOLTAGE)?;
        Ok((raw >> BUS_VOLTAGE_SHIFT) * BUS_VOLTAGE_LSB_MV)
    }

    /// Shunt voltage in millivolts. The register is two's complement, so
    /// reverse current reads negative.
    pub fn read_shunt_voltage_mv(&mut self) -> Result<f32, Error> {
        let raw = self.read_register(REG_SHUNT_VOLTAGE)? as i16;
        Ok(f32::from(raw) * SHUNT_VOLTAGE_LSB_MV)
    }

    /// Current register as-is, for calibration and debugging
    pub fn read_current_raw(&mut self) -> Result<i16, Error> {
        Ok(self.read_register(REG_CURRENT)? as i16)
    }

    /// Current in milliamps using the active profile's divisor
    pub fn read_current_ma(&mut self) -> Result<i16, Error> {
        let profile = self.active_profile()?;
        let raw = self.read_current_raw()?;
        Ok(profile.current_ma(raw))
    }

    /// Power register as-is
    pub fn read_power_raw(&mut self) -> Result<u16, Error> {
        self.read_register(REG_POWER)
    }

    /// Power in milliwatts using the active profile's multiplier
    pub fn read_power_mw(&mut self) -> Result<f32, Error> {
        let profile = self.active_profile()?;
        let raw = self.read_power_raw()?;
        Ok(profile.power_mw(raw))
    }

    /// Read the bus voltage and express it as battery charge percentage
    pub fn battery_percentage(&mut self, range: &BatteryRange) -> Result<f32, Error> {
        let bus_mv = self.read_bus_voltage_mv()?;
        let percent = battery_percentage(bus_mv, range.max_mv, range.min_mv);
        debug!("INA219 bus {} mV -> battery {}%", bus_mv, percent);
        Ok(percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ina219::fake::FakeIna219;
    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

    const NACK: ErrorKind = ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data);

    fn calibrated(profile: CalibrationProfile) -> Ina219<FakeIna219> {
        let mut ina = Ina219::new(FakeIna219::new(), DEFAULT_ADDRESS);
        ina.apply_calibration(profile).unwrap();
        ina
    }

    #[test]
    fn test_apply_calibration_writes_both_registers() {
        let ina = calibrated(CalibrationProfile::RANGE_16V_400MA);

        assert_eq!(ina.calibration(), Some(&CalibrationProfile::RANGE_16V_400MA));
        let fake = ina.release();
        assert_eq!(fake.register(REG_CALIBRATION), 8192);
        assert_eq!(fake.register(REG_CONFIG), 0x019F);
    }

    #[test]
    fn test_32v_2a_current_and_power_scenario() {
        let mut ina = calibrated(CalibrationProfile::RANGE_32V_2A);
        ina.transport.set_register(REG_CURRENT, 100);
        ina.transport.set_register(REG_POWER, 50);

        assert_eq!(ina.read_current_ma().unwrap(), 10);
        assert_eq!(ina.read_power_mw().unwrap(), 100.0);
    }

    #[test]
    fn test_switching_profile_changes_scaling() {
        let mut fake = FakeIna219::new();
        fake.set_register(REG_CURRENT, 1000);
        fake.set_register(REG_POWER, 10);
        let mut ina = Ina219::new(fake, DEFAULT_ADDRESS);

        ina.apply_calibration(CalibrationProfile::RANGE_32V_1A).unwrap();
        assert_eq!(ina.read_current_ma().unwrap(), 40);
        assert!((ina.read_power_mw().unwrap() - 8.0).abs() < 1e-4);

        ina.apply_calibration(CalibrationProfile::RANGE_16V_400MA).unwrap();
        assert_eq!(ina.read_current_ma().unwrap(), 50);
        assert_eq!(ina.read_power_mw().unwrap(), 10.0);
    }

    #[test]
    fn test_negative_current() {
        let mut fake = FakeIna219::new();
        fake.set_register(REG_CURRENT, (-250i16) as u16);
        let mut ina = Ina219::new(fake, DEFAULT_ADDRESS);
        ina.apply_calibration(CalibrationProfile::RANGE_32V_2A).unwrap();

        assert_eq!(ina.read_current_raw().unwrap(), -250);
        assert_eq!(ina.read_current_ma().unwrap(), -25);
    }

    #[test]
    fn test_bus_voltage_is_always_multiple_of_four() {
        let mut ina = Ina219::new(FakeIna219::new(), DEFAULT_ADDRESS);

        for raw in 0..=u16::MAX {
            ina.transport.set_register(REG_BUS_VOLTAGE, raw);

            let mv = ina.read_bus_voltage_mv().unwrap();
            assert_eq!(mv % 4, 0);
            assert_eq!(mv, (raw >> 3) * 4);
        }
    }

    #[test]
    fn test_bus_voltage_discards_status_bits() {
        let mut fake = FakeIna219::new();
        // 12 V = 3000 counts, with CNVR and OVF set
        fake.set_register(REG_BUS_VOLTAGE, (3000 << 3) | 0b011);
        let mut ina = Ina219::new(fake, DEFAULT_ADDRESS);

        assert_eq!(ina.read_bus_voltage_mv().unwrap(), 12000);
    }

    #[test]
    fn test_shunt_voltage_is_signed() {
        let mut ina = Ina219::new(FakeIna219::new(), DEFAULT_ADDRESS);

        ina.transport.set_register(REG_SHUNT_VOLTAGE, 3200);
        assert!((ina.read_shunt_voltage_mv().unwrap() - 32.0).abs() < 1e-4);

        ina.transport.set_register(REG_SHUNT_VOLTAGE, (-3200i16) as u16);
        assert!((ina.read_shunt_voltage_mv().unwrap() + 32.0).abs() < 1e-4);
    }

    #[test]
    fn test_uncalibrated_conversions_are_rejected() {
        let mut ina = Ina219::new(FakeIna219::new(), DEFAULT_ADDRESS);

        assert_eq!(ina.read_current_ma(), Err(Error::NotCalibrated));
        assert_eq!(ina.read_power_mw(), Err(Error::NotCalibrated));
        // Fixed-LSB readings do not need a profile
        assert!(ina.read_bus_voltage_mv().is_ok());
        assert!(ina.read_shunt_voltage_mv().is_ok());
        assert!(ina.read_current_raw().is_ok());
    }

    #[test]
    fn test_transport_error_names_register() {
        let mut fake = FakeIna219::new();
        fake.fail_register(REG_POWER);
        let mut ina = Ina219::new(fake, DEFAULT_ADDRESS);
        ina.apply_calibration(CalibrationProfile::RANGE_32V_2A).unwrap();

        assert_eq!(
            ina.read_power_mw(),
            Err(Error::Transport {
                register: REG_POWER,
                kind: NACK
            })
        );
    }

    #[test]
    fn test_failed_calibration_write_keeps_previous_profile() {
        let mut ina = calibrated(CalibrationProfile::RANGE_32V_2A);
        ina.transport.fail_register(REG_CALIBRATION);

        assert_eq!(
            ina.apply_calibration(CalibrationProfile::RANGE_16V_400MA),
            Err(Error::Transport {
                register: REG_CALIBRATION,
                kind: NACK
            })
        );
        assert_eq!(ina.calibration(), Some(&CalibrationProfile::RANGE_32V_2A));
    }

    #[test]
    fn test_failed_config_write_is_partial_calibration() {
        let mut fake = FakeIna219::new();
        fake.fail_register(REG_CONFIG);
        let mut ina = Ina219::new(fake, DEFAULT_ADDRESS);

        assert_eq!(
            ina.apply_calibration(CalibrationProfile::RANGE_32V_1A),
            Err(Error::PartialCalibration { kind: NACK })
        );
        assert_eq!(ina.calibration(), None);
        assert_eq!(ina.read_current_ma(), Err(Error::NotCalibrated));
        assert_eq!(ina.release().register(REG_CALIBRATION), 10240);
    }

    #[test]
    fn test_reset_writes_reset_bit_and_drops_profile() {
        let mut ina = calibrated(CalibrationProfile::RANGE_32V_2A);

        ina.reset().unwrap();

        assert_eq!(ina.calibration(), None);
        assert_eq!(ina.read_config().unwrap(), CONFIG_RESET);
    }

    #[test]
    fn test_set_power_mode_only_touches_mode_bits() {
        let mut ina = calibrated(CalibrationProfile::RANGE_32V_2A);

        ina.set_power_mode(OperatingMode::PowerDown).unwrap();
        assert_eq!(ina.read_config().unwrap(), 0x3998);

        ina.set_power_mode(OperatingMode::BusContinuous).unwrap();
        assert_eq!(ina.read_config().unwrap(), 0x399E);
        assert_eq!(
            OperatingMode::from_register(ina.read_config().unwrap()),
            OperatingMode::BusContinuous
        );
    }

    #[test]
    fn test_battery_percentage_from_bus_voltage() {
        let mut fake = FakeIna219::new();
        fake.set_register(REG_BUS_VOLTAGE, 1250 << 3);
        let mut ina = Ina219::new(fake, DEFAULT_ADDRESS);

        let range = BatteryRange::new(6000, 4000);
        assert_eq!(ina.battery_percentage(&range).unwrap(), 50.0);
    }
}
