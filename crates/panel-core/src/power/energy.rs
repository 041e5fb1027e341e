//! Time-integrated energy accounting.

/// Milliwatt-seconds in one milliwatt-hour
pub const MWS_PER_MWH: f64 = 3600.0;

/// Running total of energy drawn, integrated from instantaneous power
/// readings over wall-clock time.
///
/// Energy is kept in mW·s as `f64`, so increments stay exact long after the
/// total dwarfs a single sample. The total only ever grows for non-negative
/// power and is never reset implicitly.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyAccumulator {
    /// Cumulative energy in mW·s
    total_mws: f64,
    /// Timestamp of the previous tick
    last_tick_ms: u32,
    /// False until the first tick has established a baseline
    has_run_once: bool,
}

impl EnergyAccumulator {
    pub const fn new() -> Self {
        Self {
            total_mws: 0.0,
            last_tick_ms: 0,
            has_run_once: false,
        }
    }

    /// Advance the clock to `now_ms` and return the milliseconds elapsed since
    /// the previous tick.
    ///
    /// The first tick only records the baseline and returns 0. The
    /// subtraction wraps, so a millisecond counter rolling over still yields
    /// the real elapsed time.
    pub fn tick(&mut self, now_ms: u32) -> u32 {
        if !self.has_run_once {
            self.has_run_once = true;
            self.last_tick_ms = now_ms;
            return 0;
        }

        let delta_ms = now_ms.wrapping_sub(self.last_tick_ms);
        self.last_tick_ms = now_ms;
        delta_ms
    }

    /// Add `power_mw` sustained for `delta_ms` to the total.
    pub fn integrate(&mut self, power_mw: f32, delta_ms: u32) {
        self.total_mws += f64::from(power_mw) * f64::from(delta_ms) / 1000.0;
    }

    /// Tick and integrate in one step, returning the new total in mW·s.
    pub fn record(&mut self, power_mw: f32, now_ms: u32) -> f64 {
        let delta_ms = self.tick(now_ms);
        self.integrate(power_mw, delta_ms);
        self.total_mws
    }

    /// Cumulative energy in mW·s
    pub fn total_mws(&self) -> f64 {
        self.total_mws
    }

    /// Cumulative energy in mWh
    pub fn total_mwh(&self) -> f64 {
        self.total_mws / MWS_PER_MWH
    }

    pub fn has_run_once(&self) -> bool {
        self.has_run_once
    }
}
