//! Per-tick conditioned sensor snapshot.
//!
//! Produced by the sensor provider once per tick, consumed immutably by
//! the control core. Signal conditioning (filtering, pulse-to-frequency
//! conversion, staleness handling) happens in the provider; the core
//! only clamps at ingestion so a misbehaving provider cannot push the
//! controllers outside their calibrated ranges.

use serde::{Deserialize, Serialize};

use crate::error::SensorFault;

/// Conditioned driver and vehicle inputs for one control tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    /// Filtered throttle position [%], 0..=100.
    pub throttle_pct: f32,
    /// Filtered vehicle speed [km/h], 0..=250.
    pub speed_kmh: f32,
    /// Engine speed [rpm], 0..=8000.
    pub engine_rpm: f32,
    /// Output shaft speed [rpm], >= 0.
    pub output_rpm: f32,
    /// Transmission fluid temperature [°C], -40..=150.
    pub fluid_temp_c: f32,
    /// Brake pedal switch.
    pub brake_pressed: bool,
    /// Driver's overdrive switch — false inhibits fourth gear.
    pub overdrive_enabled: bool,
    /// Sport shift map selected.
    pub power_mode: bool,
    /// Per-channel fault flags (reporting only).
    pub faults: SensorFault,
}

impl Default for SensorSnapshot {
    fn default() -> Self {
        Self {
            throttle_pct: 0.0,
            speed_kmh: 0.0,
            engine_rpm: 0.0,
            output_rpm: 0.0,
            fluid_temp_c: 20.0,
            brake_pressed: false,
            overdrive_enabled: true,
            power_mode: false,
            faults: SensorFault::empty(),
        }
    }
}

impl SensorSnapshot {
    /// Clamp every numeric channel to its calibrated range.
    ///
    /// NaN inputs collapse to the range minimum.
    pub fn sanitized(mut self) -> Self {
        self.throttle_pct = clamp_or_min(self.throttle_pct, 0.0, 100.0);
        self.speed_kmh = clamp_or_min(self.speed_kmh, 0.0, 250.0);
        self.engine_rpm = clamp_or_min(self.engine_rpm, 0.0, 8000.0);
        self.output_rpm = clamp_or_min(self.output_rpm, 0.0, f32::MAX);
        self.fluid_temp_c = clamp_or_min(self.fluid_temp_c, -40.0, 150.0);
        self
    }
}

#[inline]
fn clamp_or_min(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
