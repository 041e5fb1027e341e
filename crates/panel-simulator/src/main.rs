//! Desktop simulator for the panel-rs power monitor.
//!
//! Runs panel-core's [`PowerMonitor`] against a simulated INA219 measuring a
//! battery pack that drains under a varying load. Each polling iteration is
//! logged; set `RUST_LOG=debug` to also see the core's per-poll trace.
//!
//! The simulation runs faster than real time (see [`TIME_SCALE`]) and stops
//! once the simulated pack is empty.

mod sim_ina219;

use std::time::{Duration, Instant};

use log::{error, info, warn};

use panel_core::{BatteryState, MonitorConfig, PowerMonitor, poll_shared};

use sim_ina219::SimulatedIna219;

// ---------------------------------------------------------------------------
// Simulation constants
// ---------------------------------------------------------------------------

/// Real time between polls.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Simulated milliseconds per real millisecond.
const TIME_SCALE: u32 = 20;

fn main() {
    env_logger::init();

    info!("Starting panel simulator");

    let config = MonitorConfig::default();

    // Round-trip the config the way firmware would load it from flash
    let mut buf = [0u8; 32];
    let config = match config
        .to_postcard(&mut buf)
        .and_then(|blob| MonitorConfig::from_postcard(blob))
    {
        Ok(config) => config,
        Err(e) => {
            error!("Config round-trip failed: {}", e);
            return;
        }
    };
    info!("Loaded config: {:?}", config);

    let start = Instant::now();
    let clock = move || (start.elapsed().as_millis() as u32).wrapping_mul(TIME_SCALE);

    let sensor = SimulatedIna219::new(config.address, clock);
    let monitor = match PowerMonitor::from_config(sensor, &config) {
        Ok(monitor) => monitor,
        Err(e) => {
            error!("Failed to calibrate simulated INA219: {}", e);
            return;
        }
    };
    let shared = monitor.into_shared();

    let mut last_state = BatteryState::Start;

    // -----------------------------------------------------------------------
    // Main loop
    // -----------------------------------------------------------------------
    loop {
        let poll_start = Instant::now();

        match poll_shared(&shared, &clock) {
            Ok(snapshot) => {
                info!(
                    "t={:>7} ms  {:>5} mV  {:>4} mA  {:>7.1} mW (avg {:>7.1})  {:>8.1} mWh  battery {:>5.1}% {}",
                    snapshot.timestamp_ms,
                    snapshot.bus_voltage_mv,
                    snapshot.current_ma,
                    snapshot.power_mw,
                    snapshot.average_power_mw,
                    snapshot.energy_mwh(),
                    snapshot.battery_percent,
                    snapshot.battery_state.label()
                );

                if snapshot.battery_state != last_state {
                    info!(
                        "Battery state {} -> {}",
                        last_state.label(),
                        snapshot.battery_state.label()
                    );
                    last_state = snapshot.battery_state;
                }

                if snapshot.battery_percent <= 0.0 {
                    info!("Battery empty, stopping simulation");
                    break;
                }
            }
            Err(e) => warn!("Poll failed, retrying next tick: {}", e),
        }

        // --- Poll pacing --------------------------------------------------
        let elapsed = poll_start.elapsed();
        if elapsed < POLL_INTERVAL {
            std::thread::sleep(POLL_INTERVAL - elapsed);
        }
    }

    shared.lock(|monitor| {
        let monitor = monitor.borrow();
        info!(
            "Total energy drawn: {:.1} mWh",
            monitor.energy().total_mwh()
        );
    });
}
