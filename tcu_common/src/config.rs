//! Configuration types for the TCU.
//!
//! All tunables ship with defaults equal to the production calibration;
//! a config file only needs to name the values it overrides. `validate()`
//! enforces parameter bounds and cross-field ordering so the control
//! loop never starts with a calibration it cannot honor.

use serde::{Deserialize, Serialize};

use crate::consts::TICK_PERIOD_MS;

/// Top-level TCU configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TcuConfig {
    /// Control loop timing gates.
    #[serde(default)]
    pub timing: TimingConfig,
    /// Accumulator pressure calibration.
    #[serde(default)]
    pub pressure: PressureConfig,
    /// Lockup clutch envelope.
    #[serde(default)]
    pub lockup: LockupConfig,
    /// Adaptive trim learning parameters.
    #[serde(default)]
    pub adaptive: AdaptiveConfig,
    /// Limp monitor thresholds.
    #[serde(default)]
    pub limp: LimpConfig,
    /// RT scheduling (only honored with the `rt` feature).
    #[serde(default)]
    pub rt: RtConfig,
}

/// Control loop and shift state machine timing [ms].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Control tick period.
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    /// Minimum gap between consecutive shift episodes.
    #[serde(default = "default_shift_inhibit_ms")]
    pub shift_inhibit_ms: u64,
    /// Debounce window before a requested shift is committed.
    #[serde(default = "default_shift_delay_ms")]
    pub shift_delay_ms: u64,
    /// Episode age at which the hydraulic change is considered done.
    #[serde(default = "default_shift_complete_ms")]
    pub shift_complete_ms: u64,
    /// Settle window after completion before the episode closes.
    #[serde(default = "default_shift_settle_ms")]
    pub shift_settle_ms: u64,
}

fn default_tick_period_ms() -> u64 {
    TICK_PERIOD_MS
}
fn default_shift_inhibit_ms() -> u64 {
    800
}
fn default_shift_delay_ms() -> u64 {
    150
}
fn default_shift_complete_ms() -> u64 {
    500
}
fn default_shift_settle_ms() -> u64 {
    200
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: default_tick_period_ms(),
            shift_inhibit_ms: default_shift_inhibit_ms(),
            shift_delay_ms: default_shift_delay_ms(),
            shift_complete_ms: default_shift_complete_ms(),
            shift_settle_ms: default_shift_settle_ms(),
        }
    }
}

/// Accumulator solenoid duty calibration [%].
///
/// Lower duty means less accumulator back-pressure and a firmer shift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PressureConfig {
    /// Light-throttle base duty.
    #[serde(default = "default_soft_duty")]
    pub soft_duty: i16,
    /// Mid-throttle and between-shift base duty.
    #[serde(default = "default_medium_duty")]
    pub medium_duty: i16,
    /// Heavy-throttle base duty.
    #[serde(default = "default_firm_duty")]
    pub firm_duty: i16,
    /// Kickdown base duty.
    #[serde(default = "default_kickdown_duty")]
    pub kickdown_duty: i16,
    /// Lower output clamp.
    #[serde(default = "default_duty_min")]
    pub duty_min: i16,
    /// Upper output clamp.
    #[serde(default = "default_duty_max")]
    pub duty_max: i16,
}

fn default_soft_duty() -> i16 {
    70
}
fn default_medium_duty() -> i16 {
    50
}
fn default_firm_duty() -> i16 {
    30
}
fn default_kickdown_duty() -> i16 {
    20
}
fn default_duty_min() -> i16 {
    15
}
fn default_duty_max() -> i16 {
    85
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            soft_duty: default_soft_duty(),
            medium_duty: default_medium_duty(),
            firm_duty: default_firm_duty(),
            kickdown_duty: default_kickdown_duty(),
            duty_min: default_duty_min(),
            duty_max: default_duty_max(),
        }
    }
}

/// Torque-converter lockup engagement envelope.
///
/// The enable/disable speed pair and the throttle gate pair are
/// asymmetric on purpose — that gap is the hysteresis band that keeps
/// the clutch from cycling at a steady cruise.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockupConfig {
    /// Lowest gear in which lockup may engage.
    #[serde(default = "default_lockup_enable_gear")]
    pub enable_gear: u8,
    /// Speed above which lockup may engage [km/h].
    #[serde(default = "default_lockup_enable_speed")]
    pub enable_speed_kmh: f32,
    /// Speed below which lockup must release [km/h].
    #[serde(default = "default_lockup_disable_speed")]
    pub disable_speed_kmh: f32,
    /// Throttle above which lockup may not engage [%].
    #[serde(default = "default_lockup_throttle_max")]
    pub throttle_max_pct: f32,
    /// Minimum fluid temperature for engagement [°C].
    #[serde(default = "default_lockup_min_temp")]
    pub min_fluid_temp_c: f32,
}

fn default_lockup_enable_gear() -> u8 {
    3
}
fn default_lockup_enable_speed() -> f32 {
    60.0
}
fn default_lockup_disable_speed() -> f32 {
    50.0
}
fn default_lockup_throttle_max() -> f32 {
    70.0
}
fn default_lockup_min_temp() -> f32 {
    50.0
}

impl Default for LockupConfig {
    fn default() -> Self {
        Self {
            enable_gear: default_lockup_enable_gear(),
            enable_speed_kmh: default_lockup_enable_speed(),
            disable_speed_kmh: default_lockup_disable_speed(),
            throttle_max_pct: default_lockup_throttle_max(),
            min_fluid_temp_c: default_lockup_min_temp(),
        }
    }
}

/// Adaptive trim learning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptiveConfig {
    /// Durations above this firm the shift up [ms].
    #[serde(default = "default_slow_shift_ms")]
    pub slow_shift_ms: u64,
    /// Durations below this soften the shift [ms].
    #[serde(default = "default_fast_shift_ms")]
    pub fast_shift_ms: u64,
    /// Trim step per completed shift [duty %].
    #[serde(default = "default_trim_step")]
    pub trim_step: i16,
    /// Symmetric trim clamp [duty %].
    #[serde(default = "default_trim_limit")]
    pub trim_limit: i16,
    /// No learning above this throttle [%].
    #[serde(default = "default_heavy_throttle")]
    pub heavy_throttle_pct: f32,
}

fn default_slow_shift_ms() -> u64 {
    450
}
fn default_fast_shift_ms() -> u64 {
    350
}
fn default_trim_step() -> i16 {
    2
}
fn default_trim_limit() -> i16 {
    20
}
fn default_heavy_throttle() -> f32 {
    75.0
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            slow_shift_ms: default_slow_shift_ms(),
            fast_shift_ms: default_fast_shift_ms(),
            trim_step: default_trim_step(),
            trim_limit: default_trim_limit(),
            heavy_throttle_pct: default_heavy_throttle(),
        }
    }
}

/// Limp monitor thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimpConfig {
    /// Fluid temperature that latches limp mode after persistence [°C].
    #[serde(default = "default_limp_over_temp")]
    pub over_temp_c: f32,
    /// Consecutive ticks over temperature before latching.
    #[serde(default = "default_limp_over_temp_ticks")]
    pub over_temp_ticks: u32,
    /// Consecutive ticks of implausible zero output speed before latching.
    #[serde(default = "default_limp_output_loss_ticks")]
    pub output_loss_ticks: u32,
    /// Engine speed above which a zero output reading is implausible [rpm].
    #[serde(default = "default_limp_min_engine_rpm")]
    pub min_engine_rpm: f32,
    /// Vehicle speed above which a zero output reading is implausible [km/h].
    #[serde(default = "default_limp_min_speed")]
    pub min_speed_kmh: f32,
}

fn default_limp_over_temp() -> f32 {
    140.0
}
fn default_limp_over_temp_ticks() -> u32 {
    25
}
fn default_limp_output_loss_ticks() -> u32 {
    50
}
fn default_limp_min_engine_rpm() -> f32 {
    1000.0
}
fn default_limp_min_speed() -> f32 {
    10.0
}

impl Default for LimpConfig {
    fn default() -> Self {
        Self {
            over_temp_c: default_limp_over_temp(),
            over_temp_ticks: default_limp_over_temp_ticks(),
            output_loss_ticks: default_limp_output_loss_ticks(),
            min_engine_rpm: default_limp_min_engine_rpm(),
            min_speed_kmh: default_limp_min_speed(),
        }
    }
}

/// RT scheduling parameters (only honored with the `rt` feature).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RtConfig {
    /// Isolated CPU core to pin the control thread to.
    #[serde(default = "default_cpu_core")]
    pub cpu_core: usize,
    /// SCHED_FIFO priority.
    #[serde(default = "default_rt_priority")]
    pub rt_priority: i32,
}

fn default_cpu_core() -> usize {
    1
}
fn default_rt_priority() -> i32 {
    80
}

impl Default for RtConfig {
    fn default() -> Self {
        Self {
            cpu_core: default_cpu_core(),
            rt_priority: default_rt_priority(),
        }
    }
}

impl TcuConfig {
    /// Validate parameter bounds and cross-field ordering.
    ///
    /// Returns a human-readable description of the first violation.
    pub fn validate(&self) -> Result<(), String> {
        let t = &self.timing;
        if t.tick_period_ms == 0 || t.tick_period_ms > 100 {
            return Err(format!(
                "tick_period_ms {} out of range [1, 100]",
                t.tick_period_ms
            ));
        }
        if t.shift_delay_ms >= t.shift_inhibit_ms {
            return Err(format!(
                "shift_delay_ms {} must be below shift_inhibit_ms {}",
                t.shift_delay_ms, t.shift_inhibit_ms
            ));
        }

        let p = &self.pressure;
        if !(0..=100).contains(&p.duty_min) || !(0..=100).contains(&p.duty_max) {
            return Err("pressure duty clamps must lie in [0, 100]".to_string());
        }
        if p.duty_min >= p.duty_max {
            return Err(format!(
                "duty_min {} must be below duty_max {}",
                p.duty_min, p.duty_max
            ));
        }
        for (name, duty) in [
            ("soft_duty", p.soft_duty),
            ("medium_duty", p.medium_duty),
            ("firm_duty", p.firm_duty),
            ("kickdown_duty", p.kickdown_duty),
        ] {
            if !(0..=100).contains(&duty) {
                return Err(format!("{name} {duty} out of range [0, 100]"));
            }
        }

        let l = &self.lockup;
        if l.enable_gear == 0 || l.enable_gear > 4 {
            return Err(format!(
                "lockup enable_gear {} out of range [1, 4]",
                l.enable_gear
            ));
        }
        if l.disable_speed_kmh >= l.enable_speed_kmh {
            return Err(format!(
                "lockup disable_speed {} must be below enable_speed {} (hysteresis)",
                l.disable_speed_kmh, l.enable_speed_kmh
            ));
        }

        let a = &self.adaptive;
        if a.fast_shift_ms >= a.slow_shift_ms {
            return Err(format!(
                "adaptive fast_shift_ms {} must be below slow_shift_ms {}",
                a.fast_shift_ms, a.slow_shift_ms
            ));
        }
        if a.trim_step <= 0 || a.trim_limit <= 0 || a.trim_step > a.trim_limit {
            return Err(format!(
                "adaptive trim_step {} / trim_limit {} must be positive with step <= limit",
                a.trim_step, a.trim_limit
            ));
        }

        if self.limp.over_temp_c <= self.lockup.min_fluid_temp_c {
            return Err("limp over_temp_c must exceed lockup min_fluid_temp_c".to_string());
        }

        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
