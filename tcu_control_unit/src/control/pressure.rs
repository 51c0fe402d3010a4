//! Accumulator pressure control.
//!
//! The accumulator solenoid modulates back-pressure on the shift
//! accumulators: lower duty means less cushioning and a firmer, faster
//! engagement. During a shift the base duty follows load (and kickdown),
//! the learned trim for the target gear is added on top, and fluid
//! temperature biases the result — cold fluid is sluggish, so shifts
//! run firmer; hot fluid runs softer.

use tcu::config::PressureConfig;
use tcu::state::ShiftPhase;

/// Below this fluid temperature the duty is biased firm by 20 points [°C].
const COLD_TEMP_C: f32 = 40.0;
/// Below this fluid temperature the duty is biased firm by 10 points [°C].
const COOL_TEMP_C: f32 = 60.0;
/// Above this fluid temperature the duty is biased soft by 10 points [°C].
const HOT_TEMP_C: f32 = 100.0;

/// Throttle above which the base goes firm [%].
const FIRM_THROTTLE_PCT: f32 = 60.0;
/// Throttle below which the base goes soft [%].
const SOFT_THROTTLE_PCT: f32 = 25.0;

/// Compute the accumulator solenoid duty [%] for this tick.
///
/// `trim` is the learned offset for the target gear of the active
/// episode (zero outside an episode or for a first-gear target); a
/// positive trim softens the shift.
pub fn accumulator_duty(
    cfg: &PressureConfig,
    phase: ShiftPhase,
    kickdown_active: bool,
    throttle_pct: f32,
    trim: i16,
    fluid_temp_c: f32,
) -> u8 {
    let mut base = if phase == ShiftPhase::InProgress {
        let load_base = if kickdown_active {
            cfg.kickdown_duty
        } else if throttle_pct > FIRM_THROTTLE_PCT {
            cfg.firm_duty
        } else if throttle_pct < SOFT_THROTTLE_PCT {
            cfg.soft_duty
        } else {
            cfg.medium_duty
        };
        load_base + trim
    } else {
        cfg.medium_duty
    };

    if fluid_temp_c < COLD_TEMP_C {
        base -= 20;
    } else if fluid_temp_c < COOL_TEMP_C {
        base -= 10;
    } else if fluid_temp_c > HOT_TEMP_C {
        base += 10;
    }

    base.clamp(cfg.duty_min, cfg.duty_max) as u8
}

// ─── Tests ──────────────────────────────────────────────────────────
