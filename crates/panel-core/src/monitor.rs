//! Polling aggregate tying the INA219 to energy, averaging and battery health
//!
//! A [`PowerMonitor`] owns one sensor together with all of the state derived
//! from its readings. The caller drives it by calling [`PowerMonitor::poll`]
//! once per tick with a [`Clock`]; every call returns a [`PowerSnapshot`].

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{debug, error, info, warn};
use serde::Serialize;

use crate::clock::Clock;
use crate::config::MonitorConfig;
use crate::error::Error;
use crate::ina219::{Ina219, RegisterTransport};
use crate::power::energy::MWS_PER_MWH;
use crate::power::{
    AverageMode, BatteryRange, BatteryState, EnergyAccumulator, RollingAverage, evaluate,
};

/// A [`PowerMonitor`] that can be shared between an interrupt-driven sampler
/// and the rest of the application.
pub type SharedMonitor<T> = Mutex<CriticalSectionRawMutex, RefCell<PowerMonitor<T>>>;

/// Everything one polling iteration measured and derived
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerSnapshot {
    pub timestamp_ms: u32,
    pub bus_voltage_mv: u16,
    pub shunt_voltage_mv: f32,
    pub current_ma: i16,
    pub power_mw: f32,
    /// Rolling mean of `power_mw` including this sample
    pub average_power_mw: f32,
    /// Energy drawn since the first poll, in mW·s
    pub energy_mws: f64,
    pub battery_percent: f32,
    pub battery_state: BatteryState,
}

impl PowerSnapshot {
    /// Energy drawn since the first poll, in mWh
    pub fn energy_mwh(&self) -> f64 {
        self.energy_mws / MWS_PER_MWH
    }
}

pub struct PowerMonitor<T> {
    ina: Ina219<T>,
    energy: EnergyAccumulator,
    average: RollingAverage,
    battery_state: BatteryState,
    battery_range: BatteryRange,
    /// Percentage at or below which the battery is `Low`
    low_threshold: f32,
}

impl<T> PowerMonitor<T>
where
    T: RegisterTransport,
{
    /// Wrap an already calibrated sensor
    pub fn new(
        ina: Ina219<T>,
        battery_range: BatteryRange,
        low_threshold: f32,
        average_mode: AverageMode,
    ) -> Self {
        Self {
            ina,
            energy: EnergyAccumulator::new(),
            average: RollingAverage::new(average_mode),
            battery_state: BatteryState::Start,
            battery_range,
            low_threshold,
        }
    }

    /// Build a monitor from `config` and write its calibration preset to the
    /// chip.
    ///
    /// The config is validated first; an invalid one is rejected with
    /// [`Error::Config`] before anything is written to the bus.
    pub fn from_config(transport: T, config: &MonitorConfig) -> Result<Self, Error> {
        config.validate().map_err(|e| {
            error!("Rejecting monitor config: {}", e);
            Error::from(e)
        })?;

        let mut ina = Ina219::new(transport, config.address);
        ina.apply_calibration(config.preset.profile())?;
        info!(
            "Power monitor ready: INA219 at {:#04x}, range {}, battery {}-{} mV, low below {}%",
            config.address,
            config.preset.label(),
            config.battery_min_mv,
            config.battery_max_mv,
            config.low_battery_threshold_percent
        );

        Ok(Self::new(
            ina,
            config.battery_range(),
            config.low_battery_threshold_percent,
            config.average_mode,
        ))
    }

    /// Run one polling iteration.
    ///
    /// All four registers are read before any derived state is updated. If a
    /// read fails the error is returned and energy, average and battery state
    /// are exactly as they were, so the caller can simply poll again later.
    pub fn poll<C: Clock>(&mut self, clock: &C) -> Result<PowerSnapshot, Error> {
        let bus_voltage_mv = self.ina.read_bus_voltage_mv()?;
        let shunt_voltage_mv = self.ina.read_shunt_voltage_mv()?;
        let current_ma = self.ina.read_current_ma()?;
        let power_mw = self.ina.read_power_mw()?;
        let timestamp_ms = clock.now_ms();

        let energy_mws = self.energy.record(power_mw, timestamp_ms);
        self.average.push(power_mw);
        let average_power_mw = self.average.average();

        let battery_percent = self.battery_range.percentage(bus_voltage_mv);
        let previous = self.battery_state;
        self.battery_state = evaluate(previous, battery_percent, self.low_threshold);
        if self.battery_state == BatteryState::Low && previous != BatteryState::Low {
            warn!(
                "Battery low: {}% at {} mV (threshold {}%)",
                battery_percent, bus_voltage_mv, self.low_threshold
            );
        }

        debug!(
            "t={} ms bus={} mV shunt={} mV I={} mA P={} mW avg={} mW E={} mWs battery={}% {}",
            timestamp_ms,
            bus_voltage_mv,
            shunt_voltage_mv,
            current_ma,
            power_mw,
            average_power_mw,
            energy_mws,
            battery_percent,
            self.battery_state.label()
        );

        Ok(PowerSnapshot {
            timestamp_ms,
            bus_voltage_mv,
            shunt_voltage_mv,
            current_ma,
            power_mw,
            average_power_mw,
            energy_mws,
            battery_percent,
            battery_state: self.battery_state,
        })
    }

    pub fn battery_state(&self) -> BatteryState {
        self.battery_state
    }

    pub fn energy(&self) -> &EnergyAccumulator {
        &self.energy
    }

    pub fn average(&self) -> &RollingAverage {
        &self.average
    }

    pub fn sensor(&mut self) -> &mut Ina219<T> {
        &mut self.ina
    }

    pub fn into_sensor(self) -> Ina219<T> {
        self.ina
    }

    pub fn into_shared(self) -> SharedMonitor<T> {
        Mutex::new(RefCell::new(self))
    }
}

/// Run [`PowerMonitor::poll`] on a shared monitor inside its critical section
pub fn poll_shared<T, C>(shared: &SharedMonitor<T>, clock: &C) -> Result<PowerSnapshot, Error>
where
    T: RegisterTransport,
    C: Clock,
{
    shared.lock(|monitor| monitor.borrow_mut().poll(clock))
}
