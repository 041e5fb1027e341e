//! Rolling average over the most recent power samples.

use serde::{Deserialize, Serialize};

/// Number of samples the power filter keeps by default
pub const DEFAULT_WINDOW: usize = 10;

/// How the average is formed before the window has filled up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AverageMode {
    /// Mean of the samples actually written
    #[default]
    FilledCount,
    /// Sum of the whole window divided by its capacity, unwritten slots
    /// counting as zero. Ramps up over the first `N` samples; kept for output
    /// that has to match older logs.
    ZeroPadded,
}

/// Fixed-size circular window of samples.
///
/// Once full, each new sample overwrites the oldest one.
#[derive(Debug, Clone, Copy)]
pub struct RollingAverage<const N: usize = DEFAULT_WINDOW> {
    window: [f32; N],
    /// Slot the next sample goes into, in `0..N`
    write_index: usize,
    /// Number of valid samples, in `0..=N`
    filled_count: usize,
    mode: AverageMode,
}

impl<const N: usize> RollingAverage<N> {
    pub const fn new(mode: AverageMode) -> Self {
        const { assert!(N > 0, "rolling average window must hold at least one sample") };
        Self {
            window: [0.0; N],
            write_index: 0,
            filled_count: 0,
            mode,
        }
    }

    pub fn push(&mut self, sample: f32) {
        self.window[self.write_index] = sample;
        self.write_index = (self.write_index + 1) % N;
        if self.filled_count < N {
            self.filled_count += 1;
        }
    }

    /// Mean of the window according to the filter's [`AverageMode`].
    /// An empty window averages to 0.
    ///
    /// Summed in `f64` so a window of identical samples averages back to
    /// exactly that sample.
    pub fn average(&self) -> f32 {
        if self.filled_count == 0 {
            return 0.0;
        }

        let sum: f64 = self.window.iter().map(|&sample| f64::from(sample)).sum();
        let divisor = match self.mode {
            AverageMode::FilledCount => self.filled_count,
            AverageMode::ZeroPadded => N,
        };
        (sum / divisor as f64) as f32
    }

    pub fn len(&self) -> usize {
        self.filled_count
    }

    pub fn is_empty(&self) -> bool {
        self.filled_count == 0
    }

    pub fn is_full(&self) -> bool {
        self.filled_count == N
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn mode(&self) -> AverageMode {
        self.mode
    }

    pub fn reset(&mut self) {
        self.window = [0.0; N];
        self.write_index = 0;
        self.filled_count = 0;
    }
}

impl<const N: usize> Default for RollingAverage<N> {
    fn default() -> Self {
        Self::new(AverageMode::default())
    }
}
