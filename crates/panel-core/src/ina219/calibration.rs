//! Calibration profiles and the configuration-register fields they select.

use serde::{Deserialize, Serialize};

use super::regs::{
    CONFIG_BUS_ADC_SHIFT, CONFIG_BUS_RANGE_SHIFT, CONFIG_GAIN_SHIFT, CONFIG_MODE_MASK,
    CONFIG_SHUNT_ADC_SHIFT,
};
use crate::error::Error;

// =============================================================================
// Configuration Register Enums
// =============================================================================

/// Bus voltage full-scale range (BRNG)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BusVoltageRange {
    Range16V = 0,
    Range32V = 1,
}

impl BusVoltageRange {
    pub const fn to_register(self) -> u16 {
        (self as u16) << CONFIG_BUS_RANGE_SHIFT
    }
}

/// Shunt PGA gain and the full-scale shunt voltage it allows (PG)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ShuntGain {
    /// ±40 mV
    Div1 = 0,
    /// ±80 mV
    Div2 = 1,
    /// ±160 mV
    Div4 = 2,
    /// ±320 mV
    Div8 = 3,
}

impl ShuntGain {
    pub const fn to_register(self) -> u16 {
        (self as u16) << CONFIG_GAIN_SHIFT
    }
}

/// ADC resolution or averaging setting, shared by the bus (BADC) and shunt (SADC) fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum AdcSetting {
    Bits9 = 0x0,
    Bits10 = 0x1,
    Bits11 = 0x2,
    /// 12-bit single sample, 532 µs conversion
    Bits12 = 0x3,
    Samples2 = 0x9,
    Samples4 = 0xA,
    Samples8 = 0xB,
    Samples16 = 0xC,
    Samples32 = 0xD,
    Samples64 = 0xE,
    Samples128 = 0xF,
}

impl AdcSetting {
    pub const fn code(self) -> u16 {
        self as u16
    }
}

/// Operating mode (MODE)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum OperatingMode {
    PowerDown = 0,
    ShuntTriggered = 1,
    BusTriggered = 2,
    ShuntAndBusTriggered = 3,
    AdcOff = 4,
    ShuntContinuous = 5,
    BusContinuous = 6,
    ShuntAndBusContinuous = 7,
}

impl OperatingMode {
    /// Decode the mode bits of a configuration word. All eight codes are valid.
    pub const fn from_register(config: u16) -> Self {
        match config & CONFIG_MODE_MASK {
            0 => Self::PowerDown,
            1 => Self::ShuntTriggered,
            2 => Self::BusTriggered,
            3 => Self::ShuntAndBusTriggered,
            4 => Self::AdcOff,
            5 => Self::ShuntContinuous,
            6 => Self::BusContinuous,
            _ => Self::ShuntAndBusContinuous,
        }
    }

    pub const fn to_register(self) -> u16 {
        self as u16
    }
}

// =============================================================================
// Calibration Profile
// =============================================================================

/// Everything needed to put the INA219 into a known measurement range and to
/// turn its current and power registers back into milliamps and milliwatts.
///
/// A profile is immutable. Selecting a different range means applying a
/// different profile, see [`crate::Ina219::apply_calibration`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationProfile {
    calibration_value: u16,
    current_divisor_ma: u16,
    power_multiplier_mw: f32,
    bus_voltage_range: BusVoltageRange,
    gain: ShuntGain,
    bus_adc: AdcSetting,
    shunt_adc: AdcSetting,
    mode: OperatingMode,
}

impl CalibrationProfile {
    /// 32 V bus, ±320 mV shunt, 2 A max with a 0.1 Ω shunt.
    /// Current LSB 100 µA, power LSB 2 mW.
    pub const RANGE_32V_2A: Self = Self::preset(
        4096,
        10,
        2.0,
        BusVoltageRange::Range32V,
        ShuntGain::Div8,
    );

    /// 32 V bus, ±320 mV shunt, 1 A max with a 0.1 Ω shunt.
    /// Current LSB 40 µA, power LSB 800 µW.
    pub const RANGE_32V_1A: Self = Self::preset(
        10240,
        25,
        0.8,
        BusVoltageRange::Range32V,
        ShuntGain::Div8,
    );

    /// 16 V bus, ±40 mV shunt, 400 mA max with a 0.1 Ω shunt.
    /// Current LSB 50 µA, power LSB 1 mW.
    pub const RANGE_16V_400MA: Self = Self::preset(
        8192,
        20,
        1.0,
        BusVoltageRange::Range16V,
        ShuntGain::Div1,
    );

    const fn preset(
        calibration_value: u16,
        current_divisor_ma: u16,
        power_multiplier_mw: f32,
        bus_voltage_range: BusVoltageRange,
        gain: ShuntGain,
    ) -> Self {
        Self {
            calibration_value,
            current_divisor_ma,
            power_multiplier_mw,
            bus_voltage_range,
            gain,
            bus_adc: AdcSetting::Bits12,
            shunt_adc: AdcSetting::Bits12,
            mode: OperatingMode::ShuntAndBusContinuous,
        }
    }

    /// Build a profile for a shunt or range not covered by the presets.
    ///
    /// `current_divisor_ma` is the number of current-register counts per mA
    /// (1000 / current LSB in µA). ADCs default to 12-bit continuous conversion.
    pub fn custom(
        calibration_value: u16,
        current_divisor_ma: u16,
        power_multiplier_mw: f32,
        bus_voltage_range: BusVoltageRange,
        gain: ShuntGain,
    ) -> Result<Self, Error> {
        if calibration_value == 0
            || current_divisor_ma == 0
            || !power_multiplier_mw.is_finite()
            || power_multiplier_mw <= 0.0
        {
            return Err(Error::InvalidProfile);
        }

        Ok(Self::preset(
            calibration_value,
            current_divisor_ma,
            power_multiplier_mw,
            bus_voltage_range,
            gain,
        ))
    }

    /// Same profile with different bus and shunt ADC settings
    pub const fn with_adc(mut self, bus_adc: AdcSetting, shunt_adc: AdcSetting) -> Self {
        self.bus_adc = bus_adc;
        self.shunt_adc = shunt_adc;
        self
    }

    /// Same profile with a different operating mode
    pub const fn with_mode(mut self, mode: OperatingMode) -> Self {
        self.mode = mode;
        self
    }

    /// The configuration register word this profile selects:
    /// voltage range | gain | bus ADC | shunt ADC | mode.
    pub const fn config_word(&self) -> u16 {
        self.bus_voltage_range.to_register()
            | self.gain.to_register()
            | (self.bus_adc.code() << CONFIG_BUS_ADC_SHIFT)
            | (self.shunt_adc.code() << CONFIG_SHUNT_ADC_SHIFT)
            | self.mode.to_register()
    }

    pub const fn calibration_value(&self) -> u16 {
        self.calibration_value
    }

    pub const fn current_divisor_ma(&self) -> u16 {
        self.current_divisor_ma
    }

    pub const fn power_multiplier_mw(&self) -> f32 {
        self.power_multiplier_mw
    }

    pub const fn bus_voltage_range(&self) -> BusVoltageRange {
        self.bus_voltage_range
    }

    pub const fn gain(&self) -> ShuntGain {
        self.gain
    }

    pub const fn mode(&self) -> OperatingMode {
        self.mode
    }

    /// Convert a raw current register value to milliamps.
    /// Integer division truncates toward zero.
    pub fn current_ma(&self, raw: i16) -> i16 {
        (i32::from(raw) / i32::from(self.current_divisor_ma)) as i16
    }

    /// Convert a raw power register value to milliwatts.
    pub fn power_mw(&self, raw: u16) -> f32 {
        f32::from(raw) * self.power_multiplier_mw
    }
}

/// The canonical measurement ranges, as a value that can live in a config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalibrationPreset {
    #[default]
    Range32V2A,
    Range32V1A,
    Range16V400mA,
}

impl CalibrationPreset {
    pub const fn profile(self) -> CalibrationProfile {
        match self {
            Self::Range32V2A => CalibrationProfile::RANGE_32V_2A,
            Self::Range32V1A => CalibrationProfile::RANGE_32V_1A,
            Self::Range16V400mA => CalibrationProfile::RANGE_16V_400MA,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Range32V2A => "32V/2A",
            Self::Range32V1A => "32V/1A",
            Self::Range16V400mA => "16V/400mA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_values() {
        let p = CalibrationProfile::RANGE_32V_2A;
        assert_eq!(p.calibration_value(), 4096);
        assert_eq!(p.current_divisor_ma(), 10);
        assert_eq!(p.power_multiplier_mw(), 2.0);

        let p = CalibrationProfile::RANGE_32V_1A;
        assert_eq!(p.calibration_value(), 10240);
        assert_eq!(p.current_divisor_ma(), 25);
        assert_eq!(p.power_multiplier_mw(), 0.8);

        let p = CalibrationProfile::RANGE_16V_400MA;
        assert_eq!(p.calibration_value(), 8192);
        assert_eq!(p.current_divisor_ma(), 20);
        assert_eq!(p.power_multiplier_mw(), 1.0);
    }

    #[test]
    fn test_config_words_match_datasheet_layout() {
        // 32V range | /8 gain | 12-bit bus | 12-bit shunt | shunt+bus continuous
        assert_eq!(CalibrationProfile::RANGE_32V_2A.config_word(), 0x399F);
        assert_eq!(CalibrationProfile::RANGE_32V_1A.config_word(), 0x399F);
        // 16V range | /1 gain | 12-bit bus | 12-bit shunt | shunt+bus continuous
        assert_eq!(CalibrationProfile::RANGE_16V_400MA.config_word(), 0x019F);
    }

    #[test]
    fn test_with_adc_and_mode_change_config_word() {
        let p = CalibrationProfile::RANGE_16V_400MA
            .with_adc(AdcSetting::Samples128, AdcSetting::Bits9)
            .with_mode(OperatingMode::BusTriggered);

        assert_eq!(p.config_word(), (0xF << 7) | 0x0002);
        assert_eq!(p.calibration_value(), 8192);
    }

    #[test]
    fn test_custom_profile_rejects_zero_scale() {
        let r = BusVoltageRange::Range32V;
        let g = ShuntGain::Div8;

        for (cal, divisor, multiplier) in [(0, 10, 2.0), (4096, 0, 2.0), (4096, 10, 0.0)] {
            assert_eq!(
                CalibrationProfile::custom(cal, divisor, multiplier, r, g),
                Err(Error::InvalidProfile)
            );
        }
        assert_eq!(
            CalibrationProfile::custom(4096, 10, f32::NAN, r, g),
            Err(Error::InvalidProfile)
        );
        assert_eq!(
            CalibrationProfile::custom(4096, 10, 2.0, r, g),
            Ok(CalibrationProfile::RANGE_32V_2A)
        );
    }

    #[test]
    fn test_current_conversion_truncates_toward_zero() {
        let p = CalibrationProfile::RANGE_32V_2A;
        assert_eq!(p.current_ma(100), 10);
        assert_eq!(p.current_ma(109), 10);
        assert_eq!(p.current_ma(-109), -10);
        assert_eq!(p.current_ma(i16::MIN), -3276);
        assert_eq!(p.current_ma(i16::MAX), 3276);
    }

    #[test]
    fn test_operating_mode_round_trips_all_codes() {
        for code in 0..8u16 {
            assert_eq!(OperatingMode::from_register(0x3998 | code).to_register(), code);
        }
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(
            CalibrationPreset::default().profile(),
            CalibrationProfile::RANGE_32V_2A
        );
        assert_eq!(
            CalibrationPreset::Range32V1A.profile(),
            CalibrationProfile::RANGE_32V_1A
        );
        assert_eq!(CalibrationPreset::Range16V400mA.label(), "16V/400mA");
    }
}
