//! Time utilities for game simulation

use std::time::Instant;

/// Default tick rate (ticks per second)
pub const SIMULATION_TPS: u32 = 60;
/// Default snapshot rate (snapshots per second)
pub const SNAPSHOT_TPS: u32 = 10;
/// Highest tick rate with a non-zero microsecond tick period
pub const MAX_TPS: u32 = 1_000_000;

/// Fixed delta time for the given tick rate (in seconds)
pub fn tick_delta(tick_rate: u32) -> f32 {
    1.0 / tick_rate.max(1) as f32
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
