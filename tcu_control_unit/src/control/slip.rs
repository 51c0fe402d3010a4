//! Torque-converter slip (diagnostic only).
//!
//! Compares the output shaft speed against what the engaged ratio
//! predicts from engine speed. Reported on the diagnostic surface;
//! never used in a control decision.

use tcu::consts::GEAR_RATIOS;
use tcu::state::Gear;

/// Engine speed below which the estimate is meaningless [rpm].
const MIN_ENGINE_RPM: f32 = 500.0;

/// Converter slip [%] for the engaged gear.
///
/// Returns 0 when the output shaft reads zero or the engine is below
/// idle — both make the ratio comparison meaningless.
pub fn slip_pct(gear: Gear, engine_rpm: f32, output_rpm: f32) -> f32 {
    if output_rpm <= 0.0 || engine_rpm < MIN_ENGINE_RPM {
        return 0.0;
    }
    let expected_output = engine_rpm / GEAR_RATIOS[(gear.number() - 1) as usize];
    ((expected_output - output_rpm).abs() / expected_output) * 100.0
}

// ─── Tests ──────────────────────────────────────────────────────────
