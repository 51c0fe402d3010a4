//! Solenoid actuation.
//!
//! [`SolenoidActuator`] maps the core's actuator calls onto a
//! [`PwmBackend`], deduplicating writes so the hardware only sees
//! changes. [`SimBackend`] captures the commanded outputs for bench and
//! test use.

use std::sync::{Arc, Mutex};

use tcu::interfaces::Actuator;
use tracing::debug;

/// Output channel identifiers on the solenoid driver stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputChannel {
    /// Gear-select solenoid no. 1 (binary).
    Shift1,
    /// Gear-select solenoid no. 2 (binary).
    Shift2,
    /// Accumulator back-pressure solenoid (PWM).
    Accumulator,
    /// Torque-converter lockup solenoid (PWM).
    Lockup,
}

/// Low-level output stage.
///
/// Duty is whole percent 0..=100 on the 300 Hz solenoid carrier.
pub trait PwmBackend {
    /// Drive a binary channel.
    fn write_level(&mut self, channel: OutputChannel, high: bool);
    /// Drive a PWM channel.
    fn write_duty(&mut self, channel: OutputChannel, pct: u8);
}

/// Actuator implementation over any backend.
pub struct SolenoidActuator<B: PwmBackend> {
    backend: B,
    last_s1: Option<bool>,
    last_s2: Option<bool>,
    last_accumulator: Option<u8>,
    last_lockup: Option<u8>,
}

impl<B: PwmBackend> SolenoidActuator<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            last_s1: None,
            last_s2: None,
            last_accumulator: None,
            last_lockup: None,
        }
    }

    /// Access the wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: PwmBackend> Actuator for SolenoidActuator<B> {
    fn set_gear_solenoids(&mut self, s1: bool, s2: bool) {
        if self.last_s1 != Some(s1) {
            self.backend.write_level(OutputChannel::Shift1, s1);
            self.last_s1 = Some(s1);
        }
        if self.last_s2 != Some(s2) {
            self.backend.write_level(OutputChannel::Shift2, s2);
            self.last_s2 = Some(s2);
        }
        debug!(s1, s2, "gear solenoids");
    }

    fn set_accumulator_duty(&mut self, pct: u8) {
        let pct = pct.min(100);
        if self.last_accumulator != Some(pct) {
            self.backend.write_duty(OutputChannel::Accumulator, pct);
            self.last_accumulator = Some(pct);
        }
    }

    fn set_lockup_duty(&mut self, pct: u8) {
        let pct = pct.min(100);
        if self.last_lockup != Some(pct) {
            self.backend.write_duty(OutputChannel::Lockup, pct);
            self.last_lockup = Some(pct);
        }
    }
}

/// Captured output state of the simulation backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimOutputs {
    pub shift1: bool,
    pub shift2: bool,
    pub accumulator_pct: u8,
    pub lockup_pct: u8,
    /// Total writes that reached the backend (deduplicated).
    pub writes: u32,
}

/// Backend that records the commanded outputs.
#[derive(Debug, Clone, Default)]
pub struct SimBackend {
    outputs: Arc<Mutex<SimOutputs>>,
}

impl SimBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current captured output state.
    pub fn outputs(&self) -> SimOutputs {
        *self.outputs.lock().expect("sim output lock poisoned")
    }
}

impl PwmBackend for SimBackend {
    fn write_level(&mut self, channel: OutputChannel, high: bool) {
        let mut out = self.outputs.lock().expect("sim output lock poisoned");
        match channel {
            OutputChannel::Shift1 => out.shift1 = high,
            OutputChannel::Shift2 => out.shift2 = high,
            _ => {}
        }
        out.writes += 1;
    }

    fn write_duty(&mut self, channel: OutputChannel, pct: u8) {
        let mut out = self.outputs.lock().expect("sim output lock poisoned");
        match channel {
            OutputChannel::Accumulator => out.accumulator_pct = pct,
            OutputChannel::Lockup => out.lockup_pct = pct,
            _ => {}
        }
        out.writes += 1;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
