//! Snapshot assembly.
//!
//! [`HalSensorProvider`] turns raw pulse channels, the temperature ADC
//! and the driver switches into the conditioned [`SensorSnapshot`] the
//! control core consumes. [`ManualProvider`] is the bench-side stand-in
//! that serves whatever snapshot was last stored into it.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tcu::consts::{ENGINE_STALENESS_US, SPEED_STALENESS_US};
use tcu::error::SensorFault;
use tcu::interfaces::SensorProvider;
use tcu::snapshot::SensorSnapshot;

use crate::conditioning::{adc_to_celsius, Ema};
use crate::pulse::PulseChannel;

/// Pulse-count calibration for the three speed channels.
#[derive(Debug, Clone, Copy)]
pub struct SensorCalibration {
    /// Speed sensor pulses per kilometre of road travel.
    pub pulses_per_km: f32,
    /// Igniter pulses per crankshaft revolution.
    pub engine_pulses_per_rev: f32,
    /// Output shaft sensor pulses per revolution.
    pub output_pulses_per_rev: f32,
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self {
            pulses_per_km: 2548.0,
            engine_pulses_per_rev: 2.0,
            output_pulses_per_rev: 4.0,
        }
    }
}

/// Shared input block written from interrupt/bench context.
#[derive(Debug, Default)]
pub struct SensorInputs {
    /// Vehicle speed pulse train.
    pub speed: PulseChannel,
    /// Engine RPM pulse train.
    pub engine: PulseChannel,
    /// Output shaft pulse train.
    pub output: PulseChannel,
    /// Throttle position sender [raw %], stored as f32 bits.
    throttle_raw: AtomicU32,
    /// Fluid temperature sender [V], stored as f32 bits.
    temp_volts: AtomicU32,
    /// Brake pedal switch.
    pub brake: AtomicBool,
    /// Overdrive switch.
    pub overdrive: AtomicBool,
    /// Power (sport) mode switch.
    pub power_mode: AtomicBool,
    /// Monotonic microsecond clock shared with the pulse writers.
    now_us: AtomicU64,
}

impl SensorInputs {
    pub fn new() -> Self {
        let inputs = Self::default();
        inputs.overdrive.store(true, Ordering::Relaxed);
        inputs.set_temp_volts(0.7); // 20 °C bench ambient
        inputs
    }

    /// Store the raw throttle position [%].
    pub fn set_throttle_raw(&self, pct: f32) {
        self.throttle_raw.store(pct.to_bits(), Ordering::Relaxed);
    }

    /// Store the temperature sender voltage [V].
    pub fn set_temp_volts(&self, volts: f32) {
        self.temp_volts.store(volts.to_bits(), Ordering::Relaxed);
    }

    /// Advance the shared microsecond clock. Pulse writers pass the same
    /// value to `record_pulse`.
    pub fn set_now_us(&self, now_us: u64) {
        self.now_us.store(now_us, Ordering::Relaxed);
    }

    fn throttle_raw(&self) -> f32 {
        f32::from_bits(self.throttle_raw.load(Ordering::Relaxed))
    }

    fn temp_volts_value(&self) -> f32 {
        f32::from_bits(self.temp_volts.load(Ordering::Relaxed))
    }

    fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::Relaxed)
    }
}

/// Production sensor provider: conditions the shared input block into a
/// snapshot on every read.
pub struct HalSensorProvider {
    inputs: Arc<SensorInputs>,
    calibration: SensorCalibration,
    filters: Mutex<Filters>,
}

#[derive(Debug)]
struct Filters {
    throttle: Ema,
    speed: Ema,
}

impl HalSensorProvider {
    pub fn new(inputs: Arc<SensorInputs>, calibration: SensorCalibration) -> Self {
        Self {
            inputs,
            calibration,
            filters: Mutex::new(Filters {
                throttle: Ema::new(0.3),
                speed: Ema::new(0.25),
            }),
        }
    }

    fn condition(&self) -> SensorSnapshot {
        let now_us = self.inputs.now_us();
        let cal = &self.calibration;

        let speed_hz = self.inputs.speed.frequency_hz(now_us, SPEED_STALENESS_US);
        let engine_hz = self.inputs.engine.frequency_hz(now_us, ENGINE_STALENESS_US);
        let output_hz = self.inputs.output.frequency_hz(now_us, SPEED_STALENESS_US);

        let speed_kmh = speed_hz * 3600.0 / cal.pulses_per_km;
        let engine_rpm = engine_hz * 60.0 / cal.engine_pulses_per_rev;
        let output_rpm = output_hz * 60.0 / cal.output_pulses_per_rev;

        let raw_temp = adc_to_celsius(self.inputs.temp_volts_value());

        let mut faults = SensorFault::empty();
        if self.inputs.speed.is_stale(now_us, SPEED_STALENESS_US) {
            faults |= SensorFault::SPEED_STALE;
        }
        if self.inputs.engine.is_stale(now_us, ENGINE_STALENESS_US) {
            faults |= SensorFault::ENGINE_STALE;
        }
        if self.inputs.output.is_stale(now_us, SPEED_STALENESS_US) {
            faults |= SensorFault::OUTPUT_STALE;
        }
        if !(-40.0..=150.0).contains(&raw_temp) {
            faults |= SensorFault::TEMP_CLAMPED;
        }

        let (throttle_pct, speed_filtered) = {
            let mut f = self.filters.lock().expect("filter lock poisoned");
            (
                f.throttle.apply(self.inputs.throttle_raw()),
                f.speed.apply(speed_kmh),
            )
        };

        SensorSnapshot {
            throttle_pct,
            speed_kmh: speed_filtered,
            engine_rpm,
            output_rpm,
            fluid_temp_c: raw_temp,
            brake_pressed: self.inputs.brake.load(Ordering::Relaxed),
            overdrive_enabled: self.inputs.overdrive.load(Ordering::Relaxed),
            power_mode: self.inputs.power_mode.load(Ordering::Relaxed),
            faults,
        }
        .sanitized()
    }
}

impl SensorProvider for HalSensorProvider {
    fn snapshot(&self) -> SensorSnapshot {
        self.condition()
    }
}

/// Bench/test provider serving the most recently stored snapshot.
#[derive(Debug, Clone, Default)]
pub struct ManualProvider {
    latest: Arc<Mutex<SensorSnapshot>>,
}

impl ManualProvider {
    pub fn new(initial: SensorSnapshot) -> Self {
        Self {
            latest: Arc::new(Mutex::new(initial)),
        }
    }

    /// Replace the served snapshot.
    pub fn store(&self, snap: SensorSnapshot) {
        *self.latest.lock().expect("snapshot lock poisoned") = snap;
    }

    /// Mutate the served snapshot in place.
    pub fn update(&self, f: impl FnOnce(&mut SensorSnapshot)) {
        let mut guard = self.latest.lock().expect("snapshot lock poisoned");
        f(&mut guard);
    }
}

impl SensorProvider for ManualProvider {
    fn snapshot(&self) -> SensorSnapshot {
        *self.latest.lock().expect("snapshot lock poisoned")
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
